//! Hardware-free chronograph
//!
//! Produces a steady reading around a base velocity with a little jitter so
//! the rest of the system can be exercised without a device attached.

use super::auto_read::{self, LoopSettings, Pacing, DEFAULT_RETRY_DELAY};
use super::error::{ChronoError, ChronoResult};
use super::link::Link;
use super::ChronoDevice;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Tuning for [`SimulatedChrono`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedSettings {
    /// Centre of the produced readings
    pub base_velocity_mps: f64,
    /// Time a single read takes
    pub read_delay: Duration,
    /// One reading per tick in auto-read mode
    pub tick: Duration,
    pub retry_delay: Duration,
}

impl Default for SimulatedSettings {
    fn default() -> Self {
        Self {
            base_velocity_mps: 175.0,
            read_delay: Duration::from_millis(100),
            tick: Duration::from_secs(1),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Simulated chronograph
#[derive(Clone)]
pub struct SimulatedChrono {
    link: Arc<Link<()>>,
    settings: SimulatedSettings,
}

impl SimulatedChrono {
    pub fn new() -> Self {
        Self::with_settings(SimulatedSettings::default())
    }

    pub fn with_settings(settings: SimulatedSettings) -> Self {
        Self {
            link: Arc::new(Link::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &SimulatedSettings {
        &self.settings
    }
}

impl Default for SimulatedChrono {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChronoDevice for SimulatedChrono {
    /// Any non-empty port works, also when already connected
    async fn connect(&self, port: &str, baud_rate: u32) -> ChronoResult<()> {
        if port.trim().is_empty() {
            return Err(ChronoError::EmptyPort);
        }
        self.link.attach_if_detached(());
        tracing::info!(port, baud_rate, "Simulated chrono connected");
        Ok(())
    }

    async fn disconnect(&self) -> ChronoResult<()> {
        if self.link.detach().is_some() {
            tracing::info!("Simulated chrono disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    async fn read_velocity(&self) -> ChronoResult<f64> {
        if !self.link.is_connected() {
            return Err(ChronoError::NotConnected);
        }
        tokio::time::sleep(self.settings.read_delay).await;
        Ok(self.settings.base_velocity_mps + jitter())
    }

    fn start_auto_read(&self, readings: mpsc::Sender<f64>, errors: mpsc::Sender<ChronoError>) {
        match self.link.begin_auto_read() {
            Ok(token) => {
                let settings = LoopSettings {
                    pacing: Pacing::Every(self.settings.tick),
                    retry_delay: self.settings.retry_delay,
                };
                auto_read::spawn_auto_read(self.clone(), settings, readings, errors, token);
            }
            Err(e) => auto_read::reject_start(&errors, e),
        }
    }

    fn stop_auto_read(&self) {
        self.link.end_auto_read();
    }

    fn is_auto_reading(&self) -> bool {
        self.link.is_auto_reading()
    }
}

/// -0.5..=0.4 m/s from the clock's sub-second nanos
fn jitter() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    ((nanos % 10) as f64 - 5.0) / 10.0
}
