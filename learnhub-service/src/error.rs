//! Unified error taxonomy for the storage facade.

use learnhub_cloud::RemoteError;
use learnhub_store::StoreError;
use thiserror::Error;

/// Result type for facade operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by [`crate::StorageService`].
///
/// Read paths (`get_projects`, `get_activities`, `get_resources`,
/// `get_badges`, `get_settings`) degrade to empty/default results instead
/// of raising; auth and mutation failures always surface.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A lookup missed: unknown account, or a mutation whose owner-scoped
    /// filter matched nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Password mismatch or rejected credentials.
    #[error("invalid credentials")]
    InvalidCredential,

    /// Duplicate account or duplicate natural key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation needs an authenticated identity and none is present.
    #[error("not authenticated")]
    Unauthenticated,

    /// Remote mode requested without connection parameters.
    #[error("backend not configured: {0}")]
    Misconfigured(String),

    /// Any other backend failure, carrying the backend's message.
    #[error("remote failure: {0}")]
    Remote(String),

    /// Local persistence failure.
    #[error("local store failure: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound => Self::NotFound("user not found".to_string()),
            StoreError::InvalidCredential => Self::InvalidCredential,
            StoreError::DuplicateAccount => {
                Self::Conflict("an account with this email already exists".to_string())
            }
            StoreError::NoCurrentUser => Self::Unauthenticated,
            StoreError::Serialization(e) => Self::Serialization(e),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<RemoteError> for StorageError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::AuthRequired => Self::Unauthenticated,
            RemoteError::Conflict(msg) => Self::Conflict(msg),
            RemoteError::NotFound(msg) => Self::NotFound(msg),
            RemoteError::Serialization(e) => Self::Serialization(e),
            other => Self::Remote(other.to_string()),
        }
    }
}
