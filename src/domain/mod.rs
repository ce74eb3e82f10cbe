//! Shotlog domain model
//!
//! - **units**: Validated measurement values (velocity, mass, length, ...)
//! - **catalog**: Live equipment records (profiles, optics, projectiles)
//! - **snapshot**: Frozen copies of catalog records held by sessions
//! - **shot**: One velocity observation
//! - **statistics**: Pure statistics over a shot list
//! - **session**: The session aggregate root
//! - **error**: Error types
//!
//! # Snapshot isolation
//!
//! ```text
//! Profile ──capture──▶ ProfileSnapshot ─┐
//!                                        ├─▶ Session ◀── record_shot(Velocity)
//! Projectile ─capture─▶ ProjectileSnapshot┘
//! ```
//!
//! Later edits to the catalog never reach an existing session.

pub mod catalog;
pub mod error;
pub mod session;
pub mod shot;
pub mod snapshot;
pub mod statistics;
pub mod units;

pub use catalog::{Profile, ProfileCategory, Projectile, SightingSystem, SightingSystemType};
pub use error::{DomainError, DomainResult};
pub use session::Session;
pub use shot::Shot;
pub use snapshot::{OpticSnapshot, ProfileSnapshot, ProjectileSnapshot};
pub use statistics::{StatisticsReport, StatsError, StatsResult};
pub use units::{Energy, Length, Magnification, Mass, Temperature, UnitError, Velocity};
