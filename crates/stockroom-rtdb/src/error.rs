//! Realtime Database error types.

use stockroom_models::InvalidKeyError;
use thiserror::Error;

/// Result type for database operations.
pub type RtdbResult<T> = Result<T, RtdbError>;

/// Errors that can occur during database operations.
///
/// Store failures pass through untranslated: repositories report exactly
/// what the client saw. Retrying is the caller's call; [`RtdbError::is_retryable`]
/// classifies, nothing here retries.
#[derive(Debug, Error)]
pub enum RtdbError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream closed: {0}")]
    StreamClosed(String),

    #[error("Record has no id: {0} requires a stored record")]
    MissingId(String),

    #[error("Invalid key: {0}")]
    InvalidKey(#[from] InvalidKeyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RtdbError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn missing_id(operation: impl Into<String>) -> Self {
        Self::MissingId(operation.into())
    }

    pub fn stream_closed(reason: impl Into<String>) -> Self {
        Self::StreamClosed(reason.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map an HTTP status code to an error.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            401 | 403 => Self::PermissionDenied(msg),
            404 => Self::NotFound(msg),
            429 => Self::RateLimited(1000),
            500..=599 => Self::ServerError(status, msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// The HTTP status this error corresponds to, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::PermissionDenied(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::RequestFailed(_) => Some(400),
            Self::RateLimited(_) => Some(429),
            Self::ServerError(status, _) => Some(*status),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RtdbError::Network(_) | RtdbError::RateLimited(_) | RtdbError::ServerError(_, _)
        )
    }

    /// Suggested wait before retrying, for rate-limited requests.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            RtdbError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}
