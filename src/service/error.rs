//! Service error types
//!
//! Every service call returns either its value or one of these. Storage
//! not-found errors are lifted into [`ServiceError::NotFound`] so callers
//! see a single "missing" outcome regardless of which layer noticed it.

use crate::chronograph::ChronoError;
use crate::domain::{DomainError, StatsError, UnitError};
use crate::storage::StorageError;
use thiserror::Error;

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Caller input rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Domain rule violated (bad measurement, shot index out of range, ...)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A single requested statistic could not be computed
    #[error(transparent)]
    Statistics(#[from] StatsError),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Chrono error: {0}")]
    Chrono(#[from] ChronoError),

    /// Chrono is enabled but port or baud rate are unusable
    #[error("Chrono is not configured correctly: {0}")]
    NotConfigured(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, id } => ServiceError::NotFound { kind, id },
            other => ServiceError::Storage(other),
        }
    }
}

impl From<UnitError> for ServiceError {
    fn from(err: UnitError) -> Self {
        ServiceError::Domain(DomainError::Unit(err))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
