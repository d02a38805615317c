//! Checker errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    /// Connection refused, DNS failure or timeout
    #[error("could not reach the API at {url}: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("{field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CheckerError {
    /// The user may simply try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}
