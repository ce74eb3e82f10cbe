//! Measurement unit types
//!
//! Dimensioned scalar wrappers used throughout the domain:
//! - `Velocity`: meters per second
//! - `Mass`: grams
//! - `Length`: millimeters
//! - `Temperature`: degrees Celsius
//! - `Magnification`: optical zoom factor
//! - `Energy`: joules, only ever derived from mass and velocity
//!
//! Every constructor validates its domain bounds. Values serialize as plain
//! numbers and are validated again when deserialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const FPS_TO_MPS: f64 = 0.3048;
const GRAIN_TO_GRAM: f64 = 0.064_798_91;
const MM_PER_INCH: f64 = 25.4;
const ABSOLUTE_ZERO_C: f64 = -273.15;

/// Errors raised when constructing a measurement value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("velocity cannot be negative, got: {0:.2} m/s")]
    NegativeVelocity(f64),

    #[error("mass must be greater than zero, got: {0:.3} g")]
    NonPositiveMass(f64),

    #[error("length cannot be negative, got: {0:.2} mm")]
    NegativeLength(f64),

    #[error("temperature cannot be below absolute zero (-273.15 °C), got: {0:.2} °C")]
    BelowAbsoluteZero(f64),

    #[error("magnification must be at least 1x, got: {0:.2}x")]
    MagnificationTooLow(f64),

    #[error("measurement must be a finite number, got: {0}")]
    NonFinite(f64),
}

fn finite(value: f64) -> Result<f64, UnitError> {
    if value.is_infinite() {
        return Err(UnitError::NonFinite(value));
    }
    Ok(value)
}

/// Velocity in meters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Velocity(f64);

impl Velocity {
    pub fn new(meters_per_second: f64) -> Result<Self, UnitError> {
        // `!(x >= 0)` also rejects NaN
        if !(finite(meters_per_second)? >= 0.0) {
            return Err(UnitError::NegativeVelocity(meters_per_second));
        }
        Ok(Self(meters_per_second))
    }

    /// Convert a feet-per-second reading; values are always stored in m/s
    pub fn from_fps(feet_per_second: f64) -> Result<Self, UnitError> {
        Self::new(feet_per_second * FPS_TO_MPS)
    }

    pub fn meters_per_second(&self) -> f64 {
        self.0
    }

    pub fn feet_per_second(&self) -> f64 {
        self.0 / FPS_TO_MPS
    }
}

impl TryFrom<f64> for Velocity {
    type Error = UnitError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Velocity> for f64 {
    fn from(v: Velocity) -> Self {
        v.0
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m/s", self.0)
    }
}

/// Mass in grams
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Mass(f64);

impl Mass {
    pub fn new(grams: f64) -> Result<Self, UnitError> {
        if !(finite(grams)? > 0.0) {
            return Err(UnitError::NonPositiveMass(grams));
        }
        Ok(Self(grams))
    }

    /// Grain is the customary projectile weight unit in ballistics
    pub fn from_grains(grains: f64) -> Result<Self, UnitError> {
        Self::new(grains * GRAIN_TO_GRAM)
    }

    pub fn grams(&self) -> f64 {
        self.0
    }

    pub fn kilograms(&self) -> f64 {
        self.0 / 1000.0
    }

    pub fn grains(&self) -> f64 {
        self.0 / GRAIN_TO_GRAM
    }

    /// Sum of two masses; both operands are already positive
    pub fn plus(&self, other: Mass) -> Mass {
        Mass(self.0 + other.0)
    }
}

impl TryFrom<f64> for Mass {
    type Error = UnitError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Mass> for f64 {
    fn from(m: Mass) -> Self {
        m.0
    }
}

impl fmt::Display for Mass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} g", self.0)
    }
}

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Length(f64);

impl Length {
    pub fn new(millimeters: f64) -> Result<Self, UnitError> {
        if !(finite(millimeters)? >= 0.0) {
            return Err(UnitError::NegativeLength(millimeters));
        }
        Ok(Self(millimeters))
    }

    pub fn from_inches(inches: f64) -> Result<Self, UnitError> {
        Self::new(inches * MM_PER_INCH)
    }

    pub fn millimeters(&self) -> f64 {
        self.0
    }

    pub fn centimeters(&self) -> f64 {
        self.0 / 10.0
    }

    pub fn meters(&self) -> f64 {
        self.0 / 1000.0
    }

    pub fn inches(&self) -> f64 {
        self.0 / MM_PER_INCH
    }
}

impl TryFrom<f64> for Length {
    type Error = UnitError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Length> for f64 {
    fn from(l: Length) -> Self {
        l.0
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} mm", self.0)
    }
}

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Temperature(f64);

impl Temperature {
    pub fn new(celsius: f64) -> Result<Self, UnitError> {
        if !(finite(celsius)? >= ABSOLUTE_ZERO_C) {
            return Err(UnitError::BelowAbsoluteZero(celsius));
        }
        Ok(Self(celsius))
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    pub fn fahrenheit(&self) -> f64 {
        self.0 * 9.0 / 5.0 + 32.0
    }
}

impl TryFrom<f64> for Temperature {
    type Error = UnitError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Temperature> for f64 {
    fn from(t: Temperature) -> Self {
        t.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} °C", self.0)
    }
}

/// Optical magnification factor (4x, 10x, ...)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Magnification(f64);

impl Magnification {
    /// No magnification, as for open sights
    pub const NONE: Magnification = Magnification(1.0);

    pub fn new(factor: f64) -> Result<Self, UnitError> {
        if !(finite(factor)? >= 1.0) {
            return Err(UnitError::MagnificationTooLow(factor));
        }
        Ok(Self(factor))
    }

    pub fn factor(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Magnification {
    type Error = UnitError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Magnification> for f64 {
    fn from(m: Magnification) -> Self {
        m.0
    }
}

impl fmt::Display for Magnification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}x", self.0)
    }
}

/// Kinetic energy in joules
///
/// There is no public constructor taking joules: energy is always derived
/// from a projectile mass and a velocity via [`Energy::kinetic`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(into = "f64")]
pub struct Energy(f64);

impl Energy {
    /// E = 1/2 * m * v², with m in kg and v in m/s
    pub fn kinetic(mass: Mass, velocity: Velocity) -> Self {
        let v = velocity.meters_per_second();
        Self(0.5 * mass.kilograms() * v * v)
    }

    /// Arithmetic mean of already derived energies
    pub(crate) fn mean(energies: &[Energy]) -> Option<Self> {
        if energies.is_empty() {
            return None;
        }
        let sum: f64 = energies.iter().map(|e| e.0).sum();
        Some(Self(sum / energies.len() as f64))
    }

    pub fn joules(&self) -> f64 {
        self.0
    }
}

impl From<Energy> for f64 {
    fn from(e: Energy) -> Self {
        e.0
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} J", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_validation() {
        assert!(Velocity::new(175.0).is_ok());
        assert!(Velocity::new(0.0).is_ok());
        assert_eq!(
            Velocity::new(-1.0),
            Err(UnitError::NegativeVelocity(-1.0))
        );
        assert!(Velocity::new(f64::NAN).is_err());
    }

    #[test]
    fn test_infinite_measurements_rejected() {
        assert_eq!(
            Velocity::new(f64::INFINITY),
            Err(UnitError::NonFinite(f64::INFINITY))
        );
        assert_eq!(
            Length::new(f64::INFINITY),
            Err(UnitError::NonFinite(f64::INFINITY))
        );
        assert_eq!(
            Temperature::new(f64::INFINITY),
            Err(UnitError::NonFinite(f64::INFINITY))
        );
        assert!(Mass::new(f64::INFINITY).is_err());
        assert!(Magnification::new(f64::INFINITY).is_err());
        assert!(Velocity::from_fps(f64::INFINITY).is_err());
        assert!(Temperature::new(f64::NEG_INFINITY).is_err());
        assert!(Velocity::new(f64::MAX).is_ok());
    }

    #[test]
    fn test_velocity_fps_conversion() {
        let v = Velocity::from_fps(1000.0).unwrap();
        assert!((v.meters_per_second() - 304.8).abs() < 1e-9);
        assert!((v.feet_per_second() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_mass_validation() {
        assert!(Mass::new(0.547).is_ok());
        assert!(Mass::new(0.0).is_err());
        assert!(Mass::new(-3.0).is_err());
    }

    #[test]
    fn test_mass_grain_conversion() {
        let m = Mass::from_grains(8.44).unwrap();
        assert!((m.grams() - 0.5469).abs() < 0.001);
        assert!((m.grains() - 8.44).abs() < 1e-9);
        assert!((Mass::new(1500.0).unwrap().kilograms() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_conversions() {
        assert!(Length::new(-0.1).is_err());
        let barrel = Length::from_inches(18.0).unwrap();
        assert!((barrel.millimeters() - 457.2).abs() < 1e-9);
        assert!((barrel.centimeters() - 45.72).abs() < 1e-9);
        assert!((barrel.meters() - 0.4572).abs() < 1e-9);
        assert!((barrel.inches() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(Temperature::new(-273.15).is_ok());
        assert!(Temperature::new(-273.16).is_err());
        assert!((Temperature::new(100.0).unwrap().fahrenheit() - 212.0).abs() < 1e-9);
    }

    #[test]
    fn test_magnification_bounds() {
        assert!(Magnification::new(1.0).is_ok());
        assert!(Magnification::new(0.5).is_err());
        assert_eq!(Magnification::NONE.factor(), 1.0);
    }

    #[test]
    fn test_kinetic_energy() {
        let mass = Mass::new(0.547).unwrap();
        let velocity = Velocity::new(175.0).unwrap();
        let energy = Energy::kinetic(mass, velocity);

        assert!((energy.joules() - 8.38).abs() < 0.05);
        assert_eq!(energy.joules(), 0.5 * (0.547 / 1000.0) * 175.0 * 175.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Velocity::new(175.0).unwrap().to_string(), "175.00 m/s");
        assert_eq!(Mass::new(0.547).unwrap().to_string(), "0.547 g");
        assert_eq!(Magnification::new(4.0).unwrap().to_string(), "4.0x");
        assert_eq!(Temperature::new(21.5).unwrap().to_string(), "21.50 °C");
    }

    #[test]
    fn test_serialization_is_plain_number_and_revalidates() {
        let json = serde_json::to_string(&Velocity::new(175.5).unwrap()).unwrap();
        assert_eq!(json, "175.5");

        let restored: Mass = serde_json::from_str("0.547").unwrap();
        assert_eq!(restored.grams(), 0.547);

        assert!(serde_json::from_str::<Mass>("-1.0").is_err());
        assert!(serde_json::from_str::<Velocity>("-5.0").is_err());
    }
}
