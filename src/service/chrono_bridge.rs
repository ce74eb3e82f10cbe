//! Poll-and-record bridge
//!
//! Connects the chronograph's auto-read stream to the session service. A
//! caller invokes [`ChronoBridge::poll_and_record`] on a timer; each call
//! makes sure the device is connected and streaming, then moves at most one
//! pending item off the channels:
//!
//! ```text
//! poll ─▶ ensure running (locked) ─▶ error pending?   ─▶ Err(Chrono)
//!                                  └▶ reading pending? ─▶ record_shot ─▶ Recorded
//!                                  └▶ nothing          ─▶ NotRecorded
//! ```
//!
//! Transport errors also tear the connection down so the next poll reconnects.

use super::dto::PollOutcome;
use super::error::{ServiceError, ServiceResult};
use super::session_service::SessionService;
use crate::chronograph::{
    auto_read_channels, ChronoDevice, ChronoError, SerialChrono, SimulatedChrono,
};
use crate::config::ChronoConfig;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{mpsc, Mutex};

/// Receiving ends of the channels handed to the running auto-read loop
struct Receivers {
    readings: mpsc::Receiver<f64>,
    errors: mpsc::Receiver<ChronoError>,
}

pub struct ChronoBridge {
    device: Arc<dyn ChronoDevice>,
    sessions: SessionService,
    config: RwLock<ChronoConfig>,
    /// Guards the whole ensure-running sequence and the receivers
    receivers: Mutex<Option<Receivers>>,
}

impl ChronoBridge {
    pub fn new(device: Arc<dyn ChronoDevice>, sessions: SessionService, config: ChronoConfig) -> Self {
        Self {
            device,
            sessions,
            config: RwLock::new(config),
            receivers: Mutex::new(None),
        }
    }

    /// Simulated or serial device depending on `config.simulate`
    ///
    /// The device kind is fixed here; later `update_config` calls only
    /// change port, baud rate and the enable flags.
    pub fn from_config(config: ChronoConfig, sessions: SessionService) -> Self {
        let device: Arc<dyn ChronoDevice> = if config.simulate {
            Arc::new(SimulatedChrono::new())
        } else {
            Arc::new(SerialChrono::new())
        };
        Self::new(device, sessions, config)
    }

    pub fn config(&self) -> ChronoConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn device(&self) -> &Arc<dyn ChronoDevice> {
        &self.device
    }

    /// Auto-read loop is active
    pub fn is_running(&self) -> bool {
        self.device.is_auto_reading()
    }

    /// Record at most one pending reading into `session_id`
    pub async fn poll_and_record(&self, session_id: &str) -> ServiceResult<PollOutcome> {
        if session_id.trim().is_empty() {
            return Err(ServiceError::Validation("Session id is required".to_string()));
        }

        let config = self.config();
        if !config.wants_auto_record() {
            return Ok(PollOutcome::NotRecorded);
        }
        if !config.is_configured() {
            return Err(not_configured(&config));
        }

        // Held until the shot is saved; overlapping polls must not
        // interleave their load and save of a session
        let mut slot = self.receivers.lock().await;
        let receivers = self.ensure_running(&config, &mut slot).await?;

        if let Ok(err) = receivers.errors.try_recv() {
            if err.is_transport() {
                tracing::warn!(error = %err, "Chrono link lost, will reconnect on next poll");
                self.stop_locked(&mut slot).await;
            }
            return Err(err.into());
        }

        let velocity_mps = match receivers.readings.try_recv() {
            Ok(velocity) => velocity,
            Err(_) => return Ok(PollOutcome::NotRecorded),
        };

        let session = self.sessions.record_shot(session_id, velocity_mps)?;
        drop(slot);

        Ok(PollOutcome::Recorded {
            velocity_mps,
            session: Box::new(session),
        })
    }

    /// Connect if needed, then start the loop if it is not running
    async fn ensure_running<'a>(
        &self,
        config: &ChronoConfig,
        slot: &'a mut Option<Receivers>,
    ) -> ServiceResult<&'a mut Receivers> {
        if !self.device.is_connected() {
            self.device.connect(&config.port, config.baud_rate).await?;
            tracing::info!(port = %config.port, baud_rate = config.baud_rate, "Chrono connected");
        }

        if !self.device.is_auto_reading() {
            // Readings buffered for a previous loop are dropped with it
            *slot = None;
        }

        Ok(slot.get_or_insert_with(|| {
            let ((readings_tx, readings), (errors_tx, errors)) = auto_read_channels();
            self.device.start_auto_read(readings_tx, errors_tx);
            Receivers { readings, errors }
        }))
    }

    /// Replace the configuration
    ///
    /// The device is stopped when chrono gets disabled, when port or baud
    /// become unusable, or when either of them changes.
    pub async fn update_config(&self, config: ChronoConfig) -> ServiceResult<()> {
        let previous = {
            let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, config.clone())
        };

        let link_changed =
            previous.port != config.port || previous.baud_rate != config.baud_rate;

        if !config.enabled || !config.is_configured() || link_changed {
            let mut slot = self.receivers.lock().await;
            self.stop_locked(&mut slot).await;
        }

        Ok(())
    }

    /// Single reading outside auto-read mode, connecting first if needed
    pub async fn read_once(&self) -> ServiceResult<f64> {
        let config = self.config();
        if !config.is_configured() {
            return Err(not_configured(&config));
        }

        let _guard = self.receivers.lock().await;
        if self.device.is_auto_reading() {
            return Err(ChronoError::AlreadyRunning.into());
        }
        if !self.device.is_connected() {
            self.device.connect(&config.port, config.baud_rate).await?;
        }

        Ok(self.device.read_velocity().await?)
    }

    /// Stop the auto-read loop and disconnect
    pub async fn shutdown(&self) {
        let mut slot = self.receivers.lock().await;
        self.stop_locked(&mut slot).await;
        tracing::info!("Chrono bridge shut down");
    }

    async fn stop_locked(&self, slot: &mut Option<Receivers>) {
        self.device.stop_auto_read();
        if let Err(e) = self.device.disconnect().await {
            tracing::warn!("Chrono disconnect failed: {}", e);
        }
        *slot = None;
    }
}

fn not_configured(config: &ChronoConfig) -> ServiceError {
    ServiceError::NotConfigured(format!(
        "port {:?}, baud rate {}",
        config.port, config.baud_rate
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronograph::simulated::SimulatedSettings;
    use crate::chronograph::{ChronoResult, READINGS_CAPACITY};
    use crate::service::{CatalogService, NewProfile, NewProjectile};
    use crate::domain::ProfileCategory;
    use crate::storage::DataLayout;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Pushes a fixed script onto the channels as soon as auto-read starts
    #[derive(Default)]
    struct ScriptedDevice {
        connected: AtomicBool,
        running: AtomicBool,
        connects: AtomicUsize,
        starts: AtomicUsize,
        readings: std::sync::Mutex<Vec<f64>>,
        errors: std::sync::Mutex<Vec<ChronoError>>,
    }

    impl ScriptedDevice {
        fn with_script(readings: Vec<f64>, errors: Vec<ChronoError>) -> Self {
            Self {
                readings: std::sync::Mutex::new(readings),
                errors: std::sync::Mutex::new(errors),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ChronoDevice for ScriptedDevice {
        async fn connect(&self, _port: &str, _baud_rate: u32) -> ChronoResult<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&self) -> ChronoResult<()> {
            self.running.store(false, Ordering::SeqCst);
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn read_velocity(&self) -> ChronoResult<f64> {
            Ok(180.0)
        }

        fn start_auto_read(&self, readings: mpsc::Sender<f64>, errors: mpsc::Sender<ChronoError>) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.running.store(true, Ordering::SeqCst);
            for err in self.errors.lock().unwrap().drain(..) {
                errors.try_send(err).unwrap();
            }
            for v in self.readings.lock().unwrap().drain(..) {
                readings.try_send(v).unwrap();
            }
        }

        fn stop_auto_read(&self) {
            self.running.store(false, Ordering::SeqCst);
        }

        fn is_auto_reading(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }
    }

    struct Fixture {
        sessions: SessionService,
        session_id: String,
        _dir: TempDir,
    }

    fn create_test_fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let catalog = CatalogService::open(&layout);
        let sessions = SessionService::open(&layout);

        let profile = catalog
            .create_profile(NewProfile {
                name: "LG400".to_string(),
                category: ProfileCategory::AirRifle,
                barrel_length_mm: 420.0,
                trigger_weight_g: 1300.0,
                sight_height_mm: 50.0,
            })
            .unwrap();
        let projectile = catalog
            .create_projectile(NewProjectile {
                name: "R10".to_string(),
                weight_g: 0.53,
                bc: 0.02,
            })
            .unwrap();
        let session = sessions
            .create_session(&profile.id, &projectile.id, None, None)
            .unwrap();

        Fixture {
            sessions,
            session_id: session.id,
            _dir: dir,
        }
    }

    fn enabled_config() -> ChronoConfig {
        ChronoConfig {
            enabled: true,
            port: "/dev/ttyUSB0".to_string(),
            auto_record: true,
            ..ChronoConfig::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_does_not_touch_device() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::with_script(vec![170.0], vec![]));

        for config in [
            ChronoConfig {
                enabled: false,
                ..enabled_config()
            },
            ChronoConfig {
                auto_record: false,
                ..enabled_config()
            },
        ] {
            let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), config);
            let outcome = bridge.poll_and_record(&fixture.session_id).await.unwrap();
            assert!(!outcome.is_recorded());
        }

        assert_eq!(device.connects.load(Ordering::SeqCst), 0);
        assert_eq!(device.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_port_fails() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::default());
        let config = ChronoConfig {
            port: String::new(),
            ..enabled_config()
        };
        let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), config);

        let err = bridge.poll_and_record(&fixture.session_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotConfigured(_)));
        assert_eq!(device.connects.load(Ordering::SeqCst), 0);

        let err = bridge.poll_and_record(" ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_records_one_reading_per_poll() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::with_script(vec![170.0, 172.0], vec![]));
        let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), enabled_config());

        match bridge.poll_and_record(&fixture.session_id).await.unwrap() {
            PollOutcome::Recorded {
                velocity_mps,
                session,
            } => {
                assert_eq!(velocity_mps, 170.0);
                assert_eq!(session.shots.len(), 1);
            }
            PollOutcome::NotRecorded => panic!("expected a recorded shot"),
        }

        assert!(bridge.poll_and_record(&fixture.session_id).await.unwrap().is_recorded());
        assert!(!bridge.poll_and_record(&fixture.session_id).await.unwrap().is_recorded());

        // Connected and started once across all polls
        assert_eq!(device.connects.load(Ordering::SeqCst), 1);
        assert_eq!(device.starts.load(Ordering::SeqCst), 1);

        let stats = fixture.sessions.get_statistics(&fixture.session_id).unwrap();
        assert_eq!(stats.valid_shot_count, 2);
        assert_eq!(stats.avg_velocity_mps, 171.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_polls_persist_every_recorded_shot() {
        let fixture = create_test_fixture();
        let readings: Vec<f64> = (0..READINGS_CAPACITY)
            .map(|i| 170.0 + i as f64 * 0.25)
            .collect();
        let device = Arc::new(ScriptedDevice::with_script(readings, vec![]));
        let bridge = Arc::new(ChronoBridge::new(
            device.clone(),
            fixture.sessions.clone(),
            enabled_config(),
        ));

        let polls: Vec<_> = (0..READINGS_CAPACITY)
            .map(|_| {
                let bridge = bridge.clone();
                let session_id = fixture.session_id.clone();
                tokio::spawn(async move { bridge.poll_and_record(&session_id).await })
            })
            .collect();

        let mut recorded = 0;
        for poll in polls {
            if poll.await.unwrap().unwrap().is_recorded() {
                recorded += 1;
            }
        }

        let session = fixture.sessions.load_session(&fixture.session_id).unwrap();
        assert_eq!(recorded, READINGS_CAPACITY);
        assert_eq!(session.shots.len(), recorded);
        assert_eq!(session.statistics.valid_shot_count, recorded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_polls_connect_and_start_once() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::default());
        let bridge = Arc::new(ChronoBridge::new(
            device.clone(),
            fixture.sessions.clone(),
            enabled_config(),
        ));

        let polls: Vec<_> = (0..8)
            .map(|_| {
                let bridge = bridge.clone();
                let session_id = fixture.session_id.clone();
                tokio::spawn(async move { bridge.poll_and_record(&session_id).await })
            })
            .collect();

        for poll in polls {
            assert!(!poll.await.unwrap().unwrap().is_recorded());
        }

        assert_eq!(device.connects.load(Ordering::SeqCst), 1);
        assert_eq!(device.starts.load(Ordering::SeqCst), 1);
        assert!(bridge.is_running());
    }

    #[tokio::test]
    async fn test_errors_are_drained_before_readings() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::with_script(
            vec![170.0],
            vec![ChronoError::Malformed("abc".to_string())],
        ));
        let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), enabled_config());

        let err = bridge.poll_and_record(&fixture.session_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Chrono(ChronoError::Malformed(_))));

        // Data errors keep the loop running; the reading is still there
        assert!(bridge.is_running());
        assert!(bridge.poll_and_record(&fixture.session_id).await.unwrap().is_recorded());
    }

    #[tokio::test]
    async fn test_transport_error_forces_reconnect() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::with_script(
            vec![170.0],
            vec![ChronoError::Disconnected],
        ));
        let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), enabled_config());

        let err = bridge.poll_and_record(&fixture.session_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Chrono(ChronoError::Disconnected)));
        assert!(!device.is_connected());

        // The buffered reading went with the old loop
        assert!(!bridge.poll_and_record(&fixture.session_id).await.unwrap().is_recorded());
        assert_eq!(device.connects.load(Ordering::SeqCst), 2);
        assert_eq!(device.starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_config_stops_device() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::default());
        let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), enabled_config());

        bridge.poll_and_record(&fixture.session_id).await.unwrap();
        assert!(bridge.is_running());

        // Same link settings keep the device running
        bridge
            .update_config(ChronoConfig {
                auto_record: false,
                ..enabled_config()
            })
            .await
            .unwrap();
        assert!(bridge.is_running());

        bridge
            .update_config(ChronoConfig {
                port: "/dev/ttyUSB1".to_string(),
                ..enabled_config()
            })
            .await
            .unwrap();
        assert!(!bridge.is_running());
        assert!(!device.is_connected());
        assert_eq!(bridge.config().port, "/dev/ttyUSB1");

        bridge.poll_and_record(&fixture.session_id).await.unwrap();
        bridge
            .update_config(ChronoConfig {
                enabled: false,
                ..bridge.config()
            })
            .await
            .unwrap();
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn test_read_once() {
        let fixture = create_test_fixture();
        let device = Arc::new(ScriptedDevice::default());
        let bridge = ChronoBridge::new(device.clone(), fixture.sessions.clone(), enabled_config());

        assert_eq!(bridge.read_once().await.unwrap(), 180.0);
        assert!(device.is_connected());

        bridge.poll_and_record(&fixture.session_id).await.unwrap();
        assert!(matches!(
            bridge.read_once().await,
            Err(ServiceError::Chrono(ChronoError::AlreadyRunning))
        ));
    }

    #[tokio::test]
    async fn test_simulated_device_end_to_end() {
        let fixture = create_test_fixture();
        let device = Arc::new(SimulatedChrono::with_settings(SimulatedSettings {
            read_delay: Duration::from_millis(1),
            tick: Duration::from_millis(10),
            retry_delay: Duration::from_millis(5),
            ..SimulatedSettings::default()
        }));
        let bridge = ChronoBridge::new(device, fixture.sessions.clone(), enabled_config());

        let mut recorded = 0;
        for _ in 0..200 {
            if bridge.poll_and_record(&fixture.session_id).await.unwrap().is_recorded() {
                recorded += 1;
                if recorded == 2 {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(recorded, 2);

        bridge.shutdown().await;
        assert!(!bridge.is_running());
        assert!(!bridge.device().is_connected());

        let view = fixture.sessions.load_session(&fixture.session_id).unwrap();
        assert_eq!(view.shots.len(), 2);
    }
}
