//! API client error types.

use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error from a Google API request, classified by status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The write lost an optimistic-concurrency race (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authentication or authorization failure (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The client could not be constructed.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Whether this error means the fetched resource does not exist, as
    /// opposed to any other failure. The distinction drives the
    /// create-vs-fail branch in role reconciliation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_connect() {
            ApiError::Network(e.to_string())
        } else if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
