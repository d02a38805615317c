//! Configuration module

use std::env;
use std::time::Duration;

/// Checker configuration
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Base URL of the prediction service
    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl CheckerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("API_URL").unwrap_or(defaults.api_url),

            timeout_secs: env::var("API_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `<API_URL>/predict`, tolerant of a trailing slash
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.api_url.trim_end_matches('/'))
    }

    pub fn health_url(&self) -> String {
        format!("{}/", self.api_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let config = CheckerConfig { api_url: "http://api:8000/".to_string(), timeout_secs: 10 };
        assert_eq!(config.predict_url(), "http://api:8000/predict");
        assert_eq!(config.health_url(), "http://api:8000/");

        let config = CheckerConfig::default();
        assert_eq!(config.predict_url(), "http://127.0.0.1:8000/predict");
    }
}
