//! Background continuous-read loop shared by every device kind

use super::error::ChronoError;
use super::ChronoDevice;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pause after a failed read before trying again
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// How the loop paces its reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Read again as soon as the previous read returns
    Continuous,
    /// Read once per tick
    Every(Duration),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopSettings {
    pub pacing: Pacing,
    pub retry_delay: Duration,
}

/// Spawn the read loop for `device`
///
/// The loop stops only when `token` is cancelled or a consumer channel is
/// closed. A failed read is reported on `errors` and followed by the retry
/// delay. Sends block while a channel is full; cancellation interrupts them.
pub(crate) fn spawn_auto_read<D>(
    device: D,
    settings: LoopSettings,
    readings: mpsc::Sender<f64>,
    errors: mpsc::Sender<ChronoError>,
    token: CancellationToken,
) -> JoinHandle<()>
where
    D: ChronoDevice + 'static,
{
    tokio::spawn(async move {
        tracing::info!(pacing = ?settings.pacing, "Chrono auto-read started");
        run(&device, settings, &readings, &errors, &token).await;
        // Frees the device's auto-read slot when the loop ends on its own
        token.cancel();
        tracing::info!("Chrono auto-read stopped");
    })
}

async fn run<D: ChronoDevice>(
    device: &D,
    settings: LoopSettings,
    readings: &mpsc::Sender<f64>,
    errors: &mpsc::Sender<ChronoError>,
    token: &CancellationToken,
) {
    let mut ticker = match settings.pacing {
        Pacing::Continuous => None,
        Pacing::Every(period) => {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            Some(ticker)
        }
    };

    loop {
        if token.is_cancelled() {
            return;
        }

        if let Some(ticker) = ticker.as_mut() {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = ticker.tick() => {}
            }
        }

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = device.read_velocity() => result,
        };

        match result {
            Ok(velocity) => {
                tracing::debug!(velocity_mps = velocity, "Chrono reading");
                let sent = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    sent = readings.send(velocity) => sent,
                };
                if sent.is_err() {
                    tracing::debug!("Reading channel closed, ending auto-read");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Chrono read failed: {}", e);
                let sent = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    sent = errors.send(e) => sent,
                };
                if sent.is_err() {
                    tracing::debug!("Error channel closed, ending auto-read");
                    return;
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(settings.retry_delay) => {}
                }
            }
        }
    }
}

/// Report a refused start on the caller's error channel without blocking
pub(crate) fn reject_start(errors: &mpsc::Sender<ChronoError>, err: ChronoError) {
    tracing::warn!("Chrono auto-read not started: {}", err);
    if let Err(e) = errors.try_send(err) {
        tracing::warn!("Dropped chrono error, channel unavailable: {}", e);
    }
}
