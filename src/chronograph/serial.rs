//! Chronograph attached to a serial port
//!
//! The device writes one reading per line. Reads block, so they run on the
//! blocking thread pool. The port is opened with a short timeout; a timed-out
//! read keeps any partial line and the next read continues it.

use super::auto_read::{self, LoopSettings, Pacing, DEFAULT_RETRY_DELAY};
use super::error::{ChronoError, ChronoResult};
use super::link::Link;
use super::parse::parse_reading;
use super::{validate_params, ChronoDevice};
use async_trait::async_trait;
use std::io::{self, BufRead, BufReader, Read};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

/// Serial read timeout; bounds how long a cancelled read keeps the port busy
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(250);

type PortOpener = dyn Fn(&str, u32) -> io::Result<Box<dyn Read + Send>> + Send + Sync;

/// Buffered line reader over an open port
struct LineReader {
    source: BufReader<Box<dyn Read + Send>>,
    pending: Vec<u8>,
}

impl LineReader {
    fn new(source: Box<dyn Read + Send>) -> Self {
        Self {
            source: BufReader::new(source),
            pending: Vec::new(),
        }
    }

    /// `Ok(None)` when the port timed out before a full line arrived
    fn poll_line(&mut self) -> ChronoResult<Option<String>> {
        match self.source.read_until(b'\n', &mut self.pending) {
            Ok(_) if self.pending.ends_with(b"\n") => {
                let line = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                Ok(Some(line))
            }
            // End of stream, possibly in the middle of a line
            Ok(_) => {
                self.pending.clear();
                Err(ChronoError::Disconnected)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

type SharedReader = Arc<Mutex<LineReader>>;

struct Shared {
    link: Link<SharedReader>,
    opener: Box<PortOpener>,
}

/// RS-232 chronograph
#[derive(Clone)]
pub struct SerialChrono {
    shared: Arc<Shared>,
    retry_delay: Duration,
}

impl SerialChrono {
    pub fn new() -> Self {
        Self::with_opener(open_serial_port)
    }

    /// Use a custom way of opening the port (tests, alternative transports)
    pub fn with_opener<F>(opener: F) -> Self
    where
        F: Fn(&str, u32) -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                link: Link::new(),
                opener: Box::new(opener),
            }),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Delay between a failed read and the next attempt in the auto-read loop
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

impl Default for SerialChrono {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChronoDevice for SerialChrono {
    async fn connect(&self, port: &str, baud_rate: u32) -> ChronoResult<()> {
        validate_params(port, baud_rate)?;
        if self.shared.link.is_connected() {
            return Err(ChronoError::AlreadyConnected);
        }

        let shared = self.shared.clone();
        let port_name = port.to_string();
        let source = tokio::task::spawn_blocking(move || (shared.opener)(&port_name, baud_rate))
            .await
            .map_err(join_error)?
            .map_err(|e| ChronoError::Open {
                port: port.to_string(),
                reason: e.to_string(),
            })?;

        // A concurrent connect may have won meanwhile; our port is dropped then
        self.shared
            .link
            .attach(Arc::new(Mutex::new(LineReader::new(source))))?;

        tracing::info!(port, baud_rate, "Chrono connected");
        Ok(())
    }

    async fn disconnect(&self) -> ChronoResult<()> {
        if self.shared.link.detach().is_some() {
            tracing::info!("Chrono disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.link.is_connected()
    }

    async fn read_velocity(&self) -> ChronoResult<f64> {
        loop {
            let reader = self
                .shared
                .link
                .connection()
                .ok_or(ChronoError::NotConnected)?;

            let line = tokio::task::spawn_blocking(move || {
                reader
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .poll_line()
            })
            .await
            .map_err(join_error)??;

            if let Some(line) = line {
                return parse_reading(&line);
            }
        }
    }

    fn start_auto_read(&self, readings: mpsc::Sender<f64>, errors: mpsc::Sender<ChronoError>) {
        match self.shared.link.begin_auto_read() {
            Ok(token) => {
                let settings = LoopSettings {
                    pacing: Pacing::Continuous,
                    retry_delay: self.retry_delay,
                };
                auto_read::spawn_auto_read(self.clone(), settings, readings, errors, token);
            }
            Err(e) => auto_read::reject_start(&errors, e),
        }
    }

    fn stop_auto_read(&self) {
        self.shared.link.end_auto_read();
    }

    fn is_auto_reading(&self) -> bool {
        self.shared.link.is_auto_reading()
    }
}

fn open_serial_port(port: &str, baud_rate: u32) -> io::Result<Box<dyn Read + Send>> {
    let port = serialport::new(port, baud_rate)
        .timeout(PORT_READ_TIMEOUT)
        .open()?;
    Ok(Box::new(port))
}

fn join_error(e: tokio::task::JoinError) -> ChronoError {
    ChronoError::Io(io::Error::new(io::ErrorKind::Other, e))
}
