//! Diabetes Risk Checker - terminal front end
//!
//! Collects the eight measurements, sends them to the prediction service and
//! prints the probability, risk band, label and a cut-off based explanation.

mod client;
mod config;
mod error;
mod form;
mod render;

use std::io::{self, BufRead, Write};

use anyhow::Context;

use client::RiskClient;
use config::CheckerConfig;

/// Yes/no question; blank input picks `default`
fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    write!(output, "{} [{}] ", question, hint)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(match line.trim().to_ascii_lowercase().as_str() {
        "" => default,
        answer => answer.starts_with('y'),
    })
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CheckerConfig::from_env();
    log::info!("Diabetes Risk Checker - API: {}", config.api_url);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let client = RiskClient::new(config)?;

    match rt.block_on(client.health_check()) {
        Ok(health) => log::info!("API status: {}", health.status),
        Err(e) => log::warn!("API health check failed: {}", e),
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    loop {
        writeln!(output, "\nEnter patient measurements (press Enter to keep the default).")?;
        let Some(record) = form::read_record(&mut input, &mut output)? else {
            break;
        };

        loop {
            match rt.block_on(client.predict(&record)) {
                Ok(result) => {
                    writeln!(output, "\n{}", render::render(&record, &result))?;
                    break;
                }
                Err(e) if e.is_retryable() => {
                    writeln!(output, "\n{}\nIs the API service running?", e)?;
                    if !confirm(&mut input, &mut output, "Retry?", true)? {
                        break;
                    }
                }
                Err(e) => {
                    writeln!(output, "\n{}", e)?;
                    break;
                }
            }
        }

        if !confirm(&mut input, &mut output, "Check another patient?", false)? {
            break;
        }
    }

    Ok(())
}
