//! Storage error types

use thiserror::Error;

/// Errors that can occur in the record store
#[derive(Error, Debug)]
pub enum StorageError {
    /// No record with this id exists
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Id is empty or would escape the record directory
    #[error("Invalid record id: {0:?}")]
    InvalidId(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
