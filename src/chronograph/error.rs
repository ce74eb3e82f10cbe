//! Chronograph error types
//!
//! Errors fall into groups the caller can act on differently:
//! transport errors call for a reconnect, data errors only for a log entry
//! and another read, contention errors are reported and never retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChronoError {
    // Transport
    #[error("chrono not connected")]
    NotConnected,

    #[error("chrono disconnected (EOF)")]
    Disconnected,

    #[error("failed to read from chrono: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    // Data
    #[error("empty chrono line")]
    EmptyLine,

    #[error("invalid chrono value format: {0}")]
    Malformed(String),

    #[error("velocity out of bounds (0.1-5000 m/s), got: {0:.2}")]
    OutOfRange(f64),

    // Validation
    #[error("port cannot be empty")]
    EmptyPort,

    #[error("baud rate must be > 0")]
    InvalidBaudRate,

    // Contention
    #[error("already connected")]
    AlreadyConnected,

    #[error("auto-read already running")]
    AlreadyRunning,

    #[error("reading channel closed")]
    ChannelClosed,
}

impl ChronoError {
    /// The link to the device is gone or never existed; reconnecting may help
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChronoError::NotConnected
                | ChronoError::Disconnected
                | ChronoError::Io(_)
                | ChronoError::Open { .. }
        )
    }

    /// The device answered with something unusable; the next read may be fine
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            ChronoError::EmptyLine | ChronoError::Malformed(_) | ChronoError::OutOfRange(_)
        )
    }

    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            ChronoError::AlreadyConnected | ChronoError::AlreadyRunning
        )
    }
}

pub type ChronoResult<T> = Result<T, ChronoError>;
