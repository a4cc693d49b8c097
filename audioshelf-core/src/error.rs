//! Error types for Audioshelf Core

use thiserror::Error;

/// Result type alias using LibraryError
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Top-level error type for all Library Store operations
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A required field is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A book or file reference does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target title is already taken by another book
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LibraryError {
    pub(crate) fn book_not_found(title: &str) -> Self {
        Self::NotFound(format!("Book '{}' not found", title))
    }
}

/// Errors that occur in the catalog or blob backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Presigned URL not supported by this backend")]
    PresignedUrlNotSupported,
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
            _ => StorageError::Backend(err.to_string()),
        }
    }
}
