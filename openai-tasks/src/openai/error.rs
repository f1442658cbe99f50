//! Remote API error types and handling

use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the OpenAI API or the HTTP transport
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Insufficient quota
    #[error("Insufficient quota: {0}")]
    InsufficientQuota(String),

    /// Service unavailable
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    /// Timeout occurred
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Response parsing error
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The API returned an error not covered by a dedicated variant
    #[error("OpenAI error: {code}: {message}")]
    Api { code: String, message: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(super::client::DEFAULT_TIMEOUT_SECS)
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else if err.is_status() {
            if let Some(status) = err.status() {
                match status.as_u16() {
                    401 => ApiError::Authentication(err.to_string()),
                    429 => ApiError::RateLimit {
                        message: "Too many requests".to_string(),
                        retry_after_secs: None,
                    },
                    500..=599 => ApiError::ServiceUnavailable(err.to_string()),
                    _ => ApiError::Api {
                        code: status.to_string(),
                        message: err.to_string(),
                    },
                }
            } else {
                ApiError::Network(err.to_string())
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}
