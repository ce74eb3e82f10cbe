//! Chronograph line format
//!
//! A device sends one reading per line in m/s. Both `175.23` and `175,23`
//! are accepted.

use super::error::{ChronoError, ChronoResult};

/// Lowest plausible reading in m/s
pub const MIN_READING_MPS: f64 = 0.1;

/// Highest plausible reading in m/s
pub const MAX_READING_MPS: f64 = 5000.0;

/// Parse one line (with or without its terminator) into a velocity in m/s
pub fn parse_reading(line: &str) -> ChronoResult<f64> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ChronoError::EmptyLine);
    }

    let normalized = line.replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|e| ChronoError::Malformed(format!("{} ({})", normalized, e)))?;

    // NaN fails both comparisons and lands here too
    if !(MIN_READING_MPS..=MAX_READING_MPS).contains(&value) {
        return Err(ChronoError::OutOfRange(value));
    }

    Ok(value)
}
