//! Frozen equipment snapshots
//!
//! A session records the profile and projectile exactly as they were when
//! the session was created. Snapshots are separate types from the live
//! catalog records so nothing can hand a session a reference into the
//! catalog, and they expose no mutators.

use super::catalog::{Profile, ProfileCategory, Projectile, SightingSystem, SightingSystemType};
use super::units::{Length, Magnification, Mass};
use serde::{Deserialize, Serialize};

/// Frozen copy of a [`SightingSystem`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpticSnapshot {
    pub id: String,
    pub kind: SightingSystemType,
    pub model_name: String,
    pub weight: Mass,
    pub min_magnification: Magnification,
    pub max_magnification: Magnification,
}

impl OpticSnapshot {
    pub fn capture(optic: &SightingSystem) -> Self {
        Self {
            id: optic.id.clone(),
            kind: optic.kind,
            model_name: optic.model_name.clone(),
            weight: optic.weight,
            min_magnification: optic.min_magnification,
            max_magnification: optic.max_magnification,
        }
    }
}

/// Frozen copy of a [`Profile`], including its optional nested records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSnapshot {
    pub id: String,
    pub name: String,
    pub category: ProfileCategory,
    pub barrel_length: Length,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twist_rate: Option<Length>,
    pub trigger_weight: Mass,
    pub sight_height: Length,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optic: Option<OpticSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ammo_id: Option<String>,
}

impl ProfileSnapshot {
    /// Copy every field by value, recursing into the optic
    pub fn capture(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            category: profile.category,
            barrel_length: profile.barrel_length,
            twist_rate: profile.twist_rate,
            trigger_weight: profile.trigger_weight,
            sight_height: profile.sight_height,
            optic: profile.optic.as_ref().map(OpticSnapshot::capture),
            default_ammo_id: profile.default_ammo_id.clone(),
        }
    }

    pub fn total_weight(&self) -> Mass {
        match &self.optic {
            Some(optic) => self.trigger_weight.plus(optic.weight),
            None => self.trigger_weight,
        }
    }
}

/// Frozen copy of a [`Projectile`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: String,
    pub name: String,
    pub weight: Mass,
    pub bc: f64,
}

impl ProjectileSnapshot {
    pub fn capture(projectile: &Projectile) -> Self {
        Self {
            id: projectile.id.clone(),
            name: projectile.name.clone(),
            weight: projectile.weight,
            bc: projectile.bc,
        }
    }
}
