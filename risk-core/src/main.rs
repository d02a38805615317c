//! Training entry point
//!
//! Fits both model families, writes the winning pipeline and its threshold.

use anyhow::Context;

use risk_core::config::TrainingConfig;
use risk_core::training;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrainingConfig::from_env();
    log::info!("Starting training run...");
    log::info!("   Data: {}", config.data_path.display());
    log::info!("   Artifacts: {}", config.artifact_dir.display());
    log::info!("   Seed: {}, test size: {}, folds: {}", config.seed, config.test_size, config.cv_folds);

    let report = training::run(&config).context("training run failed")?;

    log::info!(
        "Done: {} selected, threshold {:.4}, test AUC linear {:.4} / trees {:.4}",
        report.winner,
        report.persisted_threshold.value(),
        report.linear.test_auc,
        report.tree.test_auc
    );
    Ok(())
}
