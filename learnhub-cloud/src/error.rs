//! Remote adapter error types.

use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors from the hosted auth/table service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("authentication required")]
    AuthRequired,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("duplicate key: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteError {
    /// True for a unique-violation conflict that insert paths may choose
    /// to suppress.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
