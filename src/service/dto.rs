//! Data Transfer Objects
//!
//! Read-only views returned by the services. They serialize to JSON for
//! `--json` output and carry derived values (per-shot energy, statistics)
//! so callers never recompute them from live catalog data.

use crate::domain::{ProfileSnapshot, ProjectileSnapshot, Session, StatisticsReport};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One shot with its energy derived from the session's frozen projectile mass
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShotView {
    /// Position in insertion order; the index `mark_shot_invalid` takes
    pub index: usize,
    pub velocity_mps: f64,
    pub energy_joules: f64,
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
}

/// Full session including shots and statistics
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<f64>,
    pub profile_snapshot: ProfileSnapshot,
    pub projectile_snapshot: ProjectileSnapshot,
    pub shots: Vec<ShotView>,
    pub statistics: StatisticsReport,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let mass = session.projectile_snapshot().weight;
        let shots = session
            .shots()
            .iter()
            .enumerate()
            .map(|(index, shot)| ShotView {
                index,
                velocity_mps: shot.velocity().meters_per_second(),
                energy_joules: shot.energy(mass).joules(),
                timestamp: shot.timestamp(),
                valid: shot.is_valid(),
            })
            .collect();

        Self {
            id: session.id().to_string(),
            created_at: session.created_at(),
            note: session.note().map(str::to_string),
            temperature_celsius: session.temperature().map(|t| t.celsius()),
            profile_snapshot: session.profile_snapshot().clone(),
            projectile_snapshot: session.projectile_snapshot().clone(),
            shots,
            statistics: session.statistics(),
        }
    }
}

/// Lightweight listing entry, no shots
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub profile_name: String,
    pub projectile_name: String,
    pub shot_count: usize,
    pub valid_shot_count: usize,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Absent when the session has no valid shots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_velocity_mps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_energy_joules: Option<f64>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            profile_name: session.profile_snapshot().name.clone(),
            projectile_name: session.projectile_snapshot().name.clone(),
            shot_count: session.shot_count(),
            valid_shot_count: session.valid_shot_count(),
            created_at: session.created_at(),
            note: session.note().map(str::to_string),
            avg_velocity_mps: session
                .average_velocity()
                .ok()
                .map(|v| v.meters_per_second()),
            avg_energy_joules: session.average_energy().ok().map(|e| e.joules()),
        }
    }
}

/// Result of one poll-and-record call
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    /// Chrono disabled, auto-record off, or no reading pending yet
    NotRecorded,
    /// One reading was appended to the session
    Recorded {
        velocity_mps: f64,
        session: Box<SessionView>,
    },
}

impl PollOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, PollOutcome::Recorded { .. })
    }
}
