//! Session aggregate
//!
//! A session is one measurement series: a frozen equipment snapshot plus
//! the shots recorded against it. After creation the only mutations are
//! appending shots, toggling a shot's validity, replacing the note and
//! setting or clearing the temperature. Shots are never removed.

use super::catalog::{Profile, Projectile};
use super::error::{DomainError, DomainResult};
use super::shot::Shot;
use super::snapshot::{ProfileSnapshot, ProjectileSnapshot};
use super::statistics::{self, StatisticsReport, StatsResult};
use super::units::{Energy, Temperature, Velocity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Aggregate root for a measurement series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<Temperature>,
    profile_snapshot: ProfileSnapshot,
    projectile_snapshot: ProjectileSnapshot,
    #[serde(default)]
    shots: Vec<Shot>,
}

impl Session {
    /// Start a new series, freezing the given catalog records
    pub fn new(profile: &Profile, projectile: &Projectile) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            note: None,
            temperature: None,
            profile_snapshot: ProfileSnapshot::capture(profile),
            projectile_snapshot: ProjectileSnapshot::capture(projectile),
            shots: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn temperature(&self) -> Option<Temperature> {
        self.temperature
    }

    pub fn profile_snapshot(&self) -> &ProfileSnapshot {
        &self.profile_snapshot
    }

    pub fn projectile_snapshot(&self) -> &ProjectileSnapshot {
        &self.projectile_snapshot
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// Replace the note; an empty string clears it
    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = if note.is_empty() { None } else { Some(note) };
    }

    pub fn set_temperature(&mut self, temperature: Option<Temperature>) {
        self.temperature = temperature;
    }

    /// Append a shot stamped now and return it
    pub fn record_shot(&mut self, velocity: Velocity) -> &Shot {
        self.add_shot(Shot::new(velocity))
    }

    /// Append a pre-built shot (import, replay)
    pub fn add_shot(&mut self, shot: Shot) -> &Shot {
        self.shots.push(shot);
        &self.shots[self.shots.len() - 1]
    }

    /// Flag the shot at `index` (insertion order) as a bad reading
    pub fn mark_shot_invalid(&mut self, index: usize) -> DomainResult<()> {
        self.shot_mut(index)?.mark_invalid();
        Ok(())
    }

    /// Undo a previous invalidation
    pub fn mark_shot_valid(&mut self, index: usize) -> DomainResult<()> {
        self.shot_mut(index)?.mark_valid();
        Ok(())
    }

    fn shot_mut(&mut self, index: usize) -> DomainResult<&mut Shot> {
        let len = self.shots.len();
        self.shots
            .get_mut(index)
            .ok_or(DomainError::ShotIndexOutOfRange {
                index: index as i64,
                len,
            })
    }

    pub fn shot_count(&self) -> usize {
        self.shots.len()
    }

    pub fn valid_shot_count(&self) -> usize {
        statistics::valid_shot_count(&self.shots)
    }

    pub fn average_velocity(&self) -> StatsResult<Velocity> {
        statistics::average_velocity(&self.shots)
    }

    pub fn standard_deviation(&self) -> StatsResult<f64> {
        statistics::standard_deviation(&self.shots)
    }

    pub fn min_velocity(&self) -> StatsResult<Velocity> {
        statistics::min_velocity(&self.shots)
    }

    pub fn max_velocity(&self) -> StatsResult<Velocity> {
        statistics::max_velocity(&self.shots)
    }

    pub fn extreme_spread(&self) -> StatsResult<f64> {
        statistics::extreme_spread(&self.shots)
    }

    /// Mean energy using the projectile mass frozen in this session
    pub fn average_energy(&self) -> StatsResult<Energy> {
        statistics::average_energy(&self.shots, self.projectile_snapshot.weight)
    }

    pub fn statistics(&self) -> StatisticsReport {
        StatisticsReport::compute(&self.shots, self.projectile_snapshot.weight)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session {} - {} ({} shots)",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.profile_snapshot.name,
            self.shot_count()
        )
    }
}
