//! # Shotlog
//!
//! Muzzle-velocity session logger. Readings from a chronograph (serial or
//! simulated) are recorded into sessions that hold frozen copies of the
//! equipment they were shot with, and ballistic statistics are computed over
//! the valid shots.
//!
//! ## Modules
//!
//! - [`domain`]: Measurement units, equipment records, sessions and statistics
//! - [`storage`]: JSON-file record repository
//! - [`chronograph`]: Device contract, serial and simulated devices, auto-read loop
//! - [`service`]: Session and catalog use cases, poll-and-record bridge
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shotlog::service::{CatalogService, NewProfile, NewProjectile, SessionService};
//! use shotlog::domain::ProfileCategory;
//! use shotlog::storage::DataLayout;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let layout = DataLayout::new("./shotlog_data");
//!     layout.create_all()?;
//!
//!     let catalog = CatalogService::open(&layout);
//!     let sessions = SessionService::open(&layout);
//!
//!     let rifle = catalog.create_profile(NewProfile {
//!         name: "Steyr Challenge E".into(),
//!         category: ProfileCategory::AirRifle,
//!         barrel_length_mm: 420.0,
//!         trigger_weight_g: 1500.0,
//!         sight_height_mm: 55.0,
//!     })?;
//!     let pellet = catalog.create_projectile(NewProjectile {
//!         name: "JSB Exact 4.52".into(),
//!         weight_g: 0.547,
//!         bc: 0.021,
//!     })?;
//!
//!     let session = sessions.create_session(&rifle.id, &pellet.id, Some(21.5), None)?;
//!     sessions.record_shot(&session.id, 175.2)?;
//!     sessions.record_shot(&session.id, 174.8)?;
//!
//!     println!("{}", sessions.get_statistics(&session.id)?);
//!     Ok(())
//! }
//! ```

pub mod chronograph;
pub mod config;
pub mod domain;
pub mod service;
pub mod storage;

// Re-export top-level types for convenience
pub use domain::{
    DomainError, DomainResult, Profile, ProfileCategory, Projectile, Session, Shot,
    SightingSystem, SightingSystemType, StatisticsReport, StatsError,
};

pub use storage::{DataLayout, JsonRepository, Record, RecordStore, StorageError, StorageResult};

pub use chronograph::{ChronoDevice, ChronoError, ChronoResult, SerialChrono, SimulatedChrono};

pub use service::{
    CatalogService, ChronoBridge, PollOutcome, ServiceError, ServiceResult, SessionService,
    SessionSummary, SessionView,
};

pub use config::{ChronoConfig, Config, ConfigError, LoggingConfig, StorageConfig};
