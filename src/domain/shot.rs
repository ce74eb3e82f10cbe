//! A single velocity observation

use super::units::{Energy, Mass, Velocity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One chronograph reading
///
/// Velocity and timestamp are fixed at construction. The validity flag is
/// the only state that may change afterwards. Energy is not stored: it is
/// derived on demand from the mass the caller supplies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shot {
    timestamp: DateTime<Utc>,
    velocity: Velocity,
    valid: bool,
}

impl Shot {
    /// Create a valid shot stamped with the current time
    pub fn new(velocity: Velocity) -> Self {
        Self::at(velocity, Utc::now())
    }

    /// Create a valid shot with an explicit timestamp (import, replay, tests)
    pub fn at(velocity: Velocity, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            velocity,
            valid: true,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn mark_invalid(&mut self) {
        self.valid = false;
    }

    pub fn mark_valid(&mut self) {
        self.valid = true;
    }

    /// Kinetic energy for the given projectile mass
    pub fn energy(&self, projectile_mass: Mass) -> Energy {
        Energy::kinetic(projectile_mass, self.velocity)
    }

    /// Time between `other` and this shot
    pub fn elapsed_since(&self, other: &Shot) -> chrono::Duration {
        self.timestamp - other.timestamp
    }
}

impl fmt::Display for Shot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.valid { "✓" } else { "✗" };
        write!(
            f,
            "[{}] {} {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.velocity,
            mark
        )
    }
}
