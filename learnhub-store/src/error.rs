//! Local store error types.

use thiserror::Error;

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the local persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("an account with this email already exists")]
    DuplicateAccount,

    #[error("no local user is signed in")]
    NoCurrentUser,

    #[error("store lock poisoned")]
    Poisoned,
}
