//! Domain error types

use super::units::UnitError;
use thiserror::Error;

/// Errors raised by domain entities and aggregates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A measurement value failed validation
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// A required text field was empty
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// Unknown profile category tag
    #[error("invalid profile category: {0}")]
    InvalidCategory(String),

    /// Unknown sighting system tag
    #[error("invalid sighting system type: {0}")]
    InvalidSightingType(String),

    /// Optic magnification range is inverted
    #[error("min magnification ({min:.1}x) cannot be greater than max ({max:.1}x)")]
    InvertedMagnification { min: f64, max: f64 },

    /// Ballistic coefficient below zero
    #[error("ballistic coefficient cannot be negative, got: {0:.3}")]
    NegativeBallisticCoefficient(f64),

    /// Shot index outside the recorded sequence
    #[error("shot index {index} out of range (session has {len} shots)")]
    ShotIndexOutOfRange { index: i64, len: usize },
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
