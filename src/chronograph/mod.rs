//! Chronograph ingestion
//!
//! - **parse**: Line format of a reading
//! - **link**: Connection state machine shared by all devices
//! - **auto_read**: Background continuous-read loop
//! - **serial**: Chronograph on a serial port
//! - **simulated**: Hardware-free stand-in
//! - **error**: Error types
//!
//! # Data flow
//!
//! ```text
//! device ──read_velocity──▶ auto-read loop ──▶ readings (bounded mpsc)
//!                                   └────────▶ errors   (bounded mpsc)
//! ```
//!
//! Devices are cheap to clone; clones share one connection.

pub mod auto_read;
pub mod error;
pub(crate) mod link;
pub mod parse;
pub mod serial;
pub mod simulated;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use auto_read::{Pacing, DEFAULT_RETRY_DELAY};
pub use error::{ChronoError, ChronoResult};
pub use parse::{parse_reading, MAX_READING_MPS, MIN_READING_MPS};
pub use serial::SerialChrono;
pub use simulated::SimulatedChrono;

/// Capacity of the readings channel handed to `start_auto_read`
pub const READINGS_CAPACITY: usize = 16;

/// Capacity of the errors channel handed to `start_auto_read`
pub const ERRORS_CAPACITY: usize = 8;

/// A chronograph that can be connected and read
#[async_trait]
pub trait ChronoDevice: Send + Sync {
    /// Open the device
    async fn connect(&self, port: &str, baud_rate: u32) -> ChronoResult<()>;

    /// Stop any auto-read loop and release the device; a no-op when not connected
    async fn disconnect(&self) -> ChronoResult<()>;

    fn is_connected(&self) -> bool;

    /// Read a single velocity in m/s
    async fn read_velocity(&self) -> ChronoResult<f64>;

    /// Start the background loop
    ///
    /// At most one loop runs per device. When the device is disconnected or
    /// a loop is already running, exactly one error is put on `errors` and
    /// nothing else happens.
    fn start_auto_read(&self, readings: mpsc::Sender<f64>, errors: mpsc::Sender<ChronoError>);

    /// Cancel the background loop; a no-op when none runs
    fn stop_auto_read(&self);

    fn is_auto_reading(&self) -> bool;
}

/// Channel pair sized for one auto-read loop
pub fn auto_read_channels() -> (
    (mpsc::Sender<f64>, mpsc::Receiver<f64>),
    (mpsc::Sender<ChronoError>, mpsc::Receiver<ChronoError>),
) {
    (
        mpsc::channel(READINGS_CAPACITY),
        mpsc::channel(ERRORS_CAPACITY),
    )
}

fn validate_params(port: &str, baud_rate: u32) -> ChronoResult<()> {
    if port.trim().is_empty() {
        return Err(ChronoError::EmptyPort);
    }
    if baud_rate == 0 {
        return Err(ChronoError::InvalidBaudRate);
    }
    Ok(())
}
