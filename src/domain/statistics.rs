//! Statistics engine
//!
//! Pure functions over a shot list. Only shots still flagged valid take
//! part in any computation; invalidated readings are skipped but stay in
//! the list.
//!
//! Individual statistics fail with [`StatsError::InsufficientData`] when
//! there are too few valid shots. [`StatisticsReport::compute`] tolerates
//! those failures and reports zero for the affected fields.

use super::shot::Shot;
use super::units::{Energy, Mass, UnitError, Velocity};
use serde::Serialize;
use thiserror::Error;

/// Errors from individual statistics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("insufficient data: need at least {required} valid shots, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error(transparent)]
    Unit(#[from] UnitError),
}

pub type StatsResult<T> = Result<T, StatsError>;

fn valid_velocities(shots: &[Shot]) -> Vec<f64> {
    shots
        .iter()
        .filter(|s| s.is_valid())
        .map(|s| s.velocity().meters_per_second())
        .collect()
}

fn require(values: &[f64], required: usize) -> StatsResult<()> {
    if values.len() < required {
        return Err(StatsError::InsufficientData {
            required,
            available: values.len(),
        });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn valid_shot_count(shots: &[Shot]) -> usize {
    shots.iter().filter(|s| s.is_valid()).count()
}

/// Arithmetic mean of valid velocities
pub fn average_velocity(shots: &[Shot]) -> StatsResult<Velocity> {
    let values = valid_velocities(shots);
    require(&values, 1)?;
    Ok(Velocity::new(mean(&values))?)
}

/// Population standard deviation (divisor n) of valid velocities
pub fn standard_deviation(shots: &[Shot]) -> StatsResult<f64> {
    let values = valid_velocities(shots);
    require(&values, 2)?;

    let avg = mean(&values);
    let variance = values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

pub fn min_velocity(shots: &[Shot]) -> StatsResult<Velocity> {
    let values = valid_velocities(shots);
    require(&values, 1)?;
    Ok(Velocity::new(values.iter().cloned().fold(f64::INFINITY, f64::min))?)
}

pub fn max_velocity(shots: &[Shot]) -> StatsResult<Velocity> {
    let values = valid_velocities(shots);
    require(&values, 1)?;
    Ok(Velocity::new(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max))?)
}

/// Max minus min of valid velocities, in m/s
pub fn extreme_spread(shots: &[Shot]) -> StatsResult<f64> {
    let min = min_velocity(shots)?;
    let max = max_velocity(shots)?;
    Ok(max.meters_per_second() - min.meters_per_second())
}

/// Mean kinetic energy of valid shots for the given projectile mass
pub fn average_energy(shots: &[Shot], projectile_mass: Mass) -> StatsResult<Energy> {
    let energies: Vec<Energy> = shots
        .iter()
        .filter(|s| s.is_valid())
        .map(|s| s.energy(projectile_mass))
        .collect();

    Energy::mean(&energies).ok_or(StatsError::InsufficientData {
        required: 1,
        available: 0,
    })
}

/// Full statistics for a shot list
///
/// Fields whose computation lacks data are reported as zero.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StatisticsReport {
    pub avg_velocity_mps: f64,
    pub standard_deviation: f64,
    pub min_velocity_mps: f64,
    pub max_velocity_mps: f64,
    pub extreme_spread: f64,
    pub avg_energy_joules: f64,
    pub valid_shot_count: usize,
    pub total_shot_count: usize,
}

impl StatisticsReport {
    pub fn compute(shots: &[Shot], projectile_mass: Mass) -> Self {
        Self {
            avg_velocity_mps: average_velocity(shots)
                .map(|v| v.meters_per_second())
                .unwrap_or_default(),
            standard_deviation: standard_deviation(shots).unwrap_or_default(),
            min_velocity_mps: min_velocity(shots)
                .map(|v| v.meters_per_second())
                .unwrap_or_default(),
            max_velocity_mps: max_velocity(shots)
                .map(|v| v.meters_per_second())
                .unwrap_or_default(),
            extreme_spread: extreme_spread(shots).unwrap_or_default(),
            avg_energy_joules: average_energy(shots, projectile_mass)
                .map(|e| e.joules())
                .unwrap_or_default(),
            valid_shot_count: valid_shot_count(shots),
            total_shot_count: shots.len(),
        }
    }
}

impl std::fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Shots: {}/{} valid, Avg: {:.2} m/s, SD: {:.2}, ES: {:.2} ({:.2}-{:.2}), Energy: {:.2} J",
            self.valid_shot_count,
            self.total_shot_count,
            self.avg_velocity_mps,
            self.standard_deviation,
            self.extreme_spread,
            self.min_velocity_mps,
            self.max_velocity_mps,
            self.avg_energy_joules
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shots(velocities: &[f64]) -> Vec<Shot> {
        velocities
            .iter()
            .map(|&v| Shot::new(Velocity::new(v).unwrap()))
            .collect()
    }

    fn pellet() -> Mass {
        Mass::new(0.547).unwrap()
    }

    #[test]
    fn test_basic_statistics() {
        let list = shots(&[170.0, 175.0, 180.0]);

        assert_eq!(average_velocity(&list).unwrap().meters_per_second(), 175.0);
        assert!((standard_deviation(&list).unwrap() - 4.08).abs() < 0.1);
        assert_eq!(min_velocity(&list).unwrap().meters_per_second(), 170.0);
        assert_eq!(max_velocity(&list).unwrap().meters_per_second(), 180.0);
        assert_eq!(extreme_spread(&list).unwrap(), 10.0);
    }

    #[test]
    fn test_population_standard_deviation() {
        // Population SD of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let list = shots(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((standard_deviation(&list).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_shots_are_excluded() {
        let mut list = shots(&[175.0, 0.0, 176.0]);
        list[1].mark_invalid();

        assert_eq!(valid_shot_count(&list), 2);
        assert_eq!(average_velocity(&list).unwrap().meters_per_second(), 175.5);
        assert_eq!(min_velocity(&list).unwrap().meters_per_second(), 175.0);
    }

    #[test]
    fn test_insufficient_data() {
        let empty: Vec<Shot> = Vec::new();
        let insufficient = |required| StatsError::InsufficientData {
            required,
            available: 0,
        };

        assert_eq!(average_velocity(&empty), Err(insufficient(1)));
        assert_eq!(standard_deviation(&empty), Err(insufficient(2)));
        assert_eq!(min_velocity(&empty), Err(insufficient(1)));
        assert_eq!(max_velocity(&empty), Err(insufficient(1)));
        assert_eq!(extreme_spread(&empty), Err(insufficient(1)));
        assert_eq!(average_energy(&empty, pellet()), Err(insufficient(1)));

        let single = shots(&[175.0]);
        assert_eq!(
            standard_deviation(&single),
            Err(StatsError::InsufficientData {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_average_energy() {
        let list = shots(&[175.0, 175.0]);
        let energy = average_energy(&list, pellet()).unwrap();
        assert!((energy.joules() - 8.38).abs() < 0.05);
    }

    #[test]
    fn test_report_degrades_to_zero() {
        let mut list = shots(&[175.0]);
        list[0].mark_invalid();

        let report = StatisticsReport::compute(&list, pellet());
        assert_eq!(report.valid_shot_count, 0);
        assert_eq!(report.total_shot_count, 1);
        assert_eq!(report.avg_velocity_mps, 0.0);
        assert_eq!(report.standard_deviation, 0.0);
        assert_eq!(report.extreme_spread, 0.0);
        assert_eq!(report.avg_energy_joules, 0.0);
    }

    #[test]
    fn test_report_with_single_shot_keeps_other_fields() {
        let list = shots(&[175.0]);
        let report = StatisticsReport::compute(&list, pellet());

        assert_eq!(report.avg_velocity_mps, 175.0);
        assert_eq!(report.standard_deviation, 0.0);
        assert_eq!(report.extreme_spread, 0.0);
        assert!(report.avg_energy_joules > 8.0);
    }
}
