use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecapError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to read from message source: {0}")]
    SourceError(String),

    #[error("Message source rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Completion service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for RecapError {
    fn from(error: reqwest::Error) -> Self {
        RecapError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for RecapError {
    fn from(error: serde_json::Error) -> Self {
        RecapError::ParseError(error.to_string())
    }
}
