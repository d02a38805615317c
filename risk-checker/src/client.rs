//! Prediction API client

use serde::Deserialize;

use risk_core::{PatientRecord, PredictionResult};

use crate::config::CheckerConfig;
use crate::error::CheckerError;

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

fn unavailable(url: &str, e: reqwest::Error) -> CheckerError {
    CheckerError::UpstreamUnavailable {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

/// HTTP client for the prediction service
pub struct RiskClient {
    config: CheckerConfig,
    http_client: reqwest::Client,
}

impl RiskClient {
    pub fn new(config: CheckerConfig) -> Result<Self, CheckerError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CheckerError::Client(e.to_string()))?;

        Ok(Self { config, http_client })
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<HealthResponse, CheckerError> {
        let url = self.config.health_url();

        let response = self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        if response.status().is_success() {
            response.json().await
                .map_err(|e| CheckerError::Parse(e.to_string()))
        } else {
            Err(CheckerError::Api {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Score one record
    pub async fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, CheckerError> {
        let url = self.config.predict_url();
        log::debug!("POST {}", url);

        let response = self.http_client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Prediction rejected ({}): {}", status, body);
            return Err(CheckerError::Api { status: status.as_u16(), body });
        }

        let result: PredictionResult = response.json().await
            .map_err(|e| CheckerError::Parse(e.to_string()))?;

        if !(0.0..=1.0).contains(&result.probability) || result.prediction > 1 {
            return Err(CheckerError::Parse(format!(
                "out-of-range prediction: probability {}, prediction {}",
                result.probability, result.prediction
            )));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_is_retryable() {
        // Bind then drop so nothing is listening on the port
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = RiskClient::new(CheckerConfig {
            api_url: format!("http://127.0.0.1:{}", port),
            timeout_secs: 2,
        })
        .unwrap();

        let record = crate::form::default_record();
        let err = client.predict(&record).await.unwrap_err();
        assert!(err.is_retryable(), "got {:?}", err);
        assert!(err.to_string().contains("/predict"));
    }
}
