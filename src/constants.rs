//! Application-wide constants.
//!
//! This module defines the application name and the physical constants shared
//! by the built-in keycap profiles.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "keyplay";

/// Name of the per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = "keyplay";

/// Width of one keyboard unit (1U) in millimetres.
pub const KEY_UNIT: f64 = 19.05;

/// Gap left between two neighbouring keycaps in millimetres.
pub const BETWEENSPACE: f64 = 0.8;

/// Default number of OpenSCAD processes run in parallel.
pub const DEFAULT_MAX_PROCESSES: usize = 2;

/// Default per-render timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default geometry source handed to OpenSCAD.
pub const DEFAULT_SOURCE_FILE: &str = "keycap_playground.scad";

/// Returns the printable length of a keycap spanning `units` keyboard units.
#[must_use]
pub fn unit_length(units: f64) -> f64 {
    KEY_UNIT * units - BETWEENSPACE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_unit_constants() {
        assert!((KEY_UNIT - 19.05).abs() < f64::EPSILON);
        assert!((BETWEENSPACE - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unit_length() {
        assert!((unit_length(1.0) - 18.25).abs() < 1e-9);
        assert!((unit_length(1.25) - (19.05 * 1.25 - 0.8)).abs() < 1e-9);
    }
}
