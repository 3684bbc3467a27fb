//! Gateway error types.

use thiserror::Error;
use vchain_models::ValidationError;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("ARK_API_KEY is not set")]
    MissingApiKey,

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidConfig {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Service returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-2xx answer to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            400 | 422 => Self::InvalidRequest(body),
            429 => Self::RateLimited(body),
            _ => Self::RequestFailed { status, body },
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) | GatewayError::RateLimited(_) => true,
            GatewayError::RequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The request itself was rejected; sending it again cannot succeed.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, GatewayError::InvalidRequest(_))
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
