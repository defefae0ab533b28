//! Calibration types

use serde::{Deserialize, Serialize};

/// Calibration lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    #[default]
    Uncalibrated,
    Calibrating,
    Calibrated,
}

impl CalibrationState {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationState::Uncalibrated => "uncalibrated",
            CalibrationState::Calibrating => "calibrating",
            CalibrationState::Calibrated => "calibrated",
        }
    }
}

/// Resting reference captured while the user held the device still.
///
/// Only produced by a completed calibration. All deviations are population
/// statistics over the collected samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBaseline {
    /// Mean accelerometer magnitude
    pub magnitude: f64,

    /// Standard deviation of accelerometer magnitude
    pub magnitude_std: f64,

    /// Per-axis accelerometer mean (x, y, z)
    pub accel_mean: [f64; 3],

    /// Per-axis accelerometer standard deviation (x, y, z)
    pub accel_std: [f64; 3],

    /// Samples the baseline was computed from
    pub sample_count: usize,
}
