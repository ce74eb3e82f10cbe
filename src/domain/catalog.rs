//! Equipment catalog records
//!
//! Plain validated records describing the shooter's equipment:
//! - `Profile`: a rifle, pistol or bow with its hardware specs
//! - `SightingSystem`: an optic or open sights mounted on a profile
//! - `Projectile`: an ammunition type
//!
//! These are the live, editable records. Sessions never hold them directly;
//! see [`crate::domain::snapshot`] for the frozen copies.

use super::error::{DomainError, DomainResult};
use super::units::{Length, Magnification, Mass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of sporting equipment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCategory {
    AirRifle,
    AirPistol,
    Bow,
    Firearm,
}

impl ProfileCategory {
    /// Get all categories for iteration
    pub fn all() -> &'static [ProfileCategory] {
        &[
            ProfileCategory::AirRifle,
            ProfileCategory::AirPistol,
            ProfileCategory::Bow,
            ProfileCategory::Firearm,
        ]
    }

    /// Stable tag used in files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileCategory::AirRifle => "air_rifle",
            ProfileCategory::AirPistol => "air_pistol",
            ProfileCategory::Bow => "bow",
            ProfileCategory::Firearm => "firearm",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProfileCategory::AirRifle => "Air rifle",
            ProfileCategory::AirPistol => "Air pistol",
            ProfileCategory::Bow => "Bow",
            ProfileCategory::Firearm => "Firearm",
        }
    }
}

impl FromStr for ProfileCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kind of sighting system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SightingSystemType {
    Scope,
    RedDot,
    Diopter,
    OpenSights,
}

impl SightingSystemType {
    pub fn all() -> &'static [SightingSystemType] {
        &[
            SightingSystemType::Scope,
            SightingSystemType::RedDot,
            SightingSystemType::Diopter,
            SightingSystemType::OpenSights,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SightingSystemType::Scope => "scope",
            SightingSystemType::RedDot => "red_dot",
            SightingSystemType::Diopter => "diopter",
            SightingSystemType::OpenSights => "open_sights",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SightingSystemType::Scope => "Scope",
            SightingSystemType::RedDot => "Red dot",
            SightingSystemType::Diopter => "Diopter",
            SightingSystemType::OpenSights => "Open sights",
        }
    }
}

impl FromStr for SightingSystemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::InvalidSightingType(s.to_string()))
    }
}

impl fmt::Display for SightingSystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An optic or open sights
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SightingSystem {
    pub id: String,
    pub kind: SightingSystemType,
    pub model_name: String,
    pub weight: Mass,
    pub min_magnification: Magnification,
    pub max_magnification: Magnification,
}

impl SightingSystem {
    pub fn new(
        kind: SightingSystemType,
        model_name: impl Into<String>,
        weight: Mass,
        min_magnification: Magnification,
        max_magnification: Magnification,
    ) -> DomainResult<Self> {
        let model_name = model_name.into();
        if model_name.trim().is_empty() {
            return Err(DomainError::EmptyField("model name"));
        }
        if min_magnification > max_magnification {
            return Err(DomainError::InvertedMagnification {
                min: min_magnification.factor(),
                max: max_magnification.factor(),
            });
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kind,
            model_name,
            weight,
            min_magnification,
            max_magnification,
        })
    }

    /// Fixed-power optic (e.g. 4x32): min == max
    pub fn fixed(
        kind: SightingSystemType,
        model_name: impl Into<String>,
        weight: Mass,
        magnification: Magnification,
    ) -> DomainResult<Self> {
        Self::new(kind, model_name, weight, magnification, magnification)
    }

    /// Open sights never magnify
    pub fn iron_sights(model_name: impl Into<String>, weight: Mass) -> DomainResult<Self> {
        Self::fixed(
            SightingSystemType::OpenSights,
            model_name,
            weight,
            Magnification::NONE,
        )
    }

    pub fn is_variable(&self) -> bool {
        self.min_magnification != self.max_magnification
    }

    /// "3.0-9.0x" for variable optics, "4.0x" for fixed ones
    pub fn magnification_range(&self) -> String {
        if self.is_variable() {
            format!(
                "{:.1}-{:.1}x",
                self.min_magnification.factor(),
                self.max_magnification.factor()
            )
        } else {
            self.min_magnification.to_string()
        }
    }
}

impl fmt::Display for SightingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.kind,
            self.model_name,
            self.magnification_range(),
            self.weight
        )
    }
}

/// An equipment profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub category: ProfileCategory,
    pub barrel_length: Length,
    /// Smoothbores and bows have no twist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twist_rate: Option<Length>,
    pub trigger_weight: Mass,
    pub sight_height: Length,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optic: Option<SightingSystem>,
    /// Reference to a projectile record by id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ammo_id: Option<String>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        category: ProfileCategory,
        barrel_length: Length,
        trigger_weight: Mass,
        sight_height: Length,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyField("profile name"));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            category,
            barrel_length,
            twist_rate: None,
            trigger_weight,
            sight_height,
            optic: None,
            default_ammo_id: None,
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyField("profile name"));
        }
        self.name = name;
        Ok(())
    }

    pub fn set_optic(&mut self, optic: SightingSystem) {
        self.optic = Some(optic);
    }

    pub fn remove_optic(&mut self) {
        self.optic = None;
    }

    pub fn set_twist_rate(&mut self, twist_rate: Length) {
        self.twist_rate = Some(twist_rate);
    }

    pub fn clear_twist_rate(&mut self) {
        self.twist_rate = None;
    }

    pub fn set_default_ammo(&mut self, projectile_id: impl Into<String>) {
        self.default_ammo_id = Some(projectile_id.into());
    }

    /// Trigger weight stands in for the base weight; an optic adds its own
    pub fn total_weight(&self) -> Mass {
        match &self.optic {
            Some(optic) => self.trigger_weight.plus(optic.weight),
            None => self.trigger_weight,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let optic = self
            .optic
            .as_ref()
            .map(|o| o.model_name.as_str())
            .unwrap_or("no optic");
        write!(f, "{} ({}) - {}", self.name, self.category, optic)
    }
}

/// An ammunition type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projectile {
    pub id: String,
    pub name: String,
    pub weight: Mass,
    /// Ballistic coefficient
    pub bc: f64,
}

impl Projectile {
    pub fn new(name: impl Into<String>, weight: Mass, bc: f64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyField("projectile name"));
        }
        validate_bc(bc)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            weight,
            bc,
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyField("projectile name"));
        }
        self.name = name;
        Ok(())
    }

    pub fn update_bc(&mut self, bc: f64) -> DomainResult<()> {
        validate_bc(bc)?;
        self.bc = bc;
        Ok(())
    }
}

impl fmt::Display for Projectile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, BC: {:.3})", self.name, self.weight, self.bc)
    }
}

fn validate_bc(bc: f64) -> DomainResult<()> {
    if !(bc >= 0.0) {
        return Err(DomainError::NegativeBallisticCoefficient(bc));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mass(g: f64) -> Mass {
        Mass::new(g).unwrap()
    }

    fn length(mm: f64) -> Length {
        Length::new(mm).unwrap()
    }

    fn mag(x: f64) -> Magnification {
        Magnification::new(x).unwrap()
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "air_rifle".parse::<ProfileCategory>().unwrap(),
            ProfileCategory::AirRifle
        );
        assert_eq!(
            "slingshot".parse::<ProfileCategory>(),
            Err(DomainError::InvalidCategory("slingshot".to_string()))
        );
        for category in ProfileCategory::all() {
            assert_eq!(category.as_str().parse::<ProfileCategory>().unwrap(), *category);
        }
    }

    #[test]
    fn test_category_serializes_as_tag() {
        let json = serde_json::to_string(&ProfileCategory::AirPistol).unwrap();
        assert_eq!(json, "\"air_pistol\"");
        let json = serde_json::to_string(&SightingSystemType::RedDot).unwrap();
        assert_eq!(json, "\"red_dot\"");
    }

    #[test]
    fn test_sighting_system_validation() {
        let err = SightingSystem::new(
            SightingSystemType::Scope,
            "Hawke Vantage",
            mass(450.0),
            mag(9.0),
            mag(3.0),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvertedMagnification { .. }));

        let err = SightingSystem::iron_sights("  ", mass(20.0)).unwrap_err();
        assert_eq!(err, DomainError::EmptyField("model name"));
    }

    #[test]
    fn test_magnification_range() {
        let variable = SightingSystem::new(
            SightingSystemType::Scope,
            "Hawke Vantage",
            mass(450.0),
            mag(3.0),
            mag(9.0),
        )
        .unwrap();
        assert!(variable.is_variable());
        assert_eq!(variable.magnification_range(), "3.0-9.0x");

        let fixed =
            SightingSystem::fixed(SightingSystemType::Scope, "Vantage 4x32", mass(400.0), mag(4.0))
                .unwrap();
        assert!(!fixed.is_variable());
        assert_eq!(fixed.magnification_range(), "4.0x");

        let irons = SightingSystem::iron_sights("Factory", mass(15.0)).unwrap();
        assert_eq!(irons.kind, SightingSystemType::OpenSights);
        assert_eq!(irons.min_magnification.factor(), 1.0);
    }

    #[test]
    fn test_profile_creation_and_total_weight() {
        assert!(Profile::new("", ProfileCategory::Bow, length(0.0), mass(1.0), length(0.0)).is_err());

        let mut profile = Profile::new(
            "Steyr Challenge E",
            ProfileCategory::AirRifle,
            length(420.0),
            mass(1500.0),
            length(55.0),
        )
        .unwrap();
        assert_eq!(profile.total_weight().grams(), 1500.0);

        profile.set_optic(
            SightingSystem::fixed(SightingSystemType::Scope, "4x32", mass(400.0), mag(4.0)).unwrap(),
        );
        assert_eq!(profile.total_weight().grams(), 1900.0);
        assert_eq!(profile.to_string(), "Steyr Challenge E (Air rifle) - 4x32");

        profile.remove_optic();
        assert!(profile.optic.is_none());
    }

    #[test]
    fn test_projectile_bc() {
        assert!(Projectile::new("JSB Exact", mass(0.547), -0.1).is_err());

        let mut pellet = Projectile::new("JSB Exact 4.52", mass(0.547), 0.021).unwrap();
        assert!(pellet.update_bc(-1.0).is_err());
        assert_eq!(pellet.bc, 0.021);
        pellet.update_bc(0.025).unwrap();
        assert_eq!(pellet.bc, 0.025);
    }

    #[test]
    fn test_profile_roundtrip_keeps_optionals() {
        let mut profile = Profile::new(
            "FWB 800",
            ProfileCategory::AirRifle,
            length(420.0),
            mass(1200.0),
            length(60.0),
        )
        .unwrap();
        profile.set_twist_rate(length(450.0));
        profile.set_default_ammo("ammo-1");

        let json = serde_json::to_string(&profile).unwrap();
        let restored: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, profile);
    }
}
