//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::storage::DataLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub chrono: ChronoConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("shotlog").to_string_lossy().to_string())
        .unwrap_or_else(|| "./shotlog_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~/` expanded
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.data_dir)),
            None => PathBuf::from(&self.data_dir),
        }
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(self.data_path())
    }

    /// First-run setup: create every record directory
    pub fn init_layout(&self) -> std::io::Result<DataLayout> {
        let layout = self.layout();
        layout.create_all()?;
        tracing::info!(data_dir = %layout.root().display(), "Initialized data directory");
        Ok(layout)
    }
}

/// Chronograph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronoConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Serial port name, e.g. /dev/ttyUSB0 or COM3
    #[serde(default)]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Record incoming readings without a manual step
    #[serde(default)]
    pub auto_record: bool,

    /// Use the simulated device instead of a serial port
    #[serde(default)]
    pub simulate: bool,
}

fn default_baud_rate() -> u32 {
    19200
}

impl Default for ChronoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: String::new(),
            baud_rate: default_baud_rate(),
            auto_record: false,
            simulate: false,
        }
    }
}

impl ChronoConfig {
    /// Port and baud rate are usable
    pub fn is_configured(&self) -> bool {
        !self.port.trim().is_empty() && self.baud_rate > 0
    }

    /// Enabled with auto-record on
    pub fn wants_auto_record(&self) -> bool {
        self.enabled && self.auto_record
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in default_config_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Write the configuration as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            error: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Unparseable numbers and booleans leave the current value in place
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage overrides
        if let Some(data_dir) = lookup("SHOTLOG_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // Chrono overrides
        if let Some(enabled) = lookup("SHOTLOG_CHRONO_ENABLED").and_then(|v| parse_bool(&v)) {
            self.chrono.enabled = enabled;
        }
        if let Some(port) = lookup("SHOTLOG_CHRONO_PORT") {
            self.chrono.port = port;
        }
        if let Some(baud) = lookup("SHOTLOG_CHRONO_BAUD") {
            if let Ok(b) = baud.trim().parse() {
                self.chrono.baud_rate = b;
            }
        }
        if let Some(auto) = lookup("SHOTLOG_CHRONO_AUTO_RECORD").and_then(|v| parse_bool(&v)) {
            self.chrono.auto_record = auto;
        }
        if let Some(simulate) = lookup("SHOTLOG_CHRONO_SIMULATE").and_then(|v| parse_bool(&v)) {
            self.chrono.simulate = simulate;
        }

        // Logging overrides
        if let Some(level) = lookup("SHOTLOG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SHOTLOG_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Search order used by [`Config::load_default`]
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("shotlog").join("config.toml"));
    }
    paths.push(PathBuf::from("./config.toml"));
    paths
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to serialize config: {error}")]
    Serialize { error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Shotlog Configuration
#
# Environment variables override these settings:
# - SHOTLOG_DATA_DIR
# - SHOTLOG_CHRONO_ENABLED
# - SHOTLOG_CHRONO_PORT
# - SHOTLOG_CHRONO_BAUD
# - SHOTLOG_CHRONO_AUTO_RECORD
# - SHOTLOG_CHRONO_SIMULATE
# - SHOTLOG_LOG_LEVEL
# - SHOTLOG_LOG_FORMAT

[storage]
# Directory holding sessions/ and inventory/
data_dir = "~/.local/share/shotlog"

[chrono]
# Enable the chronograph
enabled = false

# Serial port, e.g. /dev/ttyUSB0 or COM3
port = ""

# Serial baud rate
baud_rate = 19200

# Record readings into the active session as they arrive
auto_record = false

# Use the simulated device instead of a serial port
simulate = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
