//! Continuous outputs relative to the calibration baseline.

use contracts::{CalibrationBaseline, DirectionalConfig, DirectionalOutput, Sample};

#[derive(Debug, Clone, Default)]
pub struct DirectionalGenerator {
    config: DirectionalConfig,
}

impl DirectionalGenerator {
    pub fn new(config: DirectionalConfig) -> Self {
        Self { config }
    }

    /// Neutral output when no baseline is available
    pub fn compute(
        &self,
        sample: &Sample,
        baseline: Option<&CalibrationBaseline>,
    ) -> DirectionalOutput {
        let Some(baseline) = baseline else {
            return DirectionalOutput::neutral();
        };

        let calibrated_magnitude = sample.accel_magnitude() - baseline.magnitude;
        let raw = sample.accel.to_array();
        let mut tilt = [0.0; 3];
        for (i, t) in tilt.iter_mut().enumerate() {
            // a perfectly still calibration has zero std
            let std = baseline.accel_std[i].max(self.config.min_std);
            *t = ((raw[i] - baseline.accel_mean[i]) / std).clamp(-1.0, 1.0);
        }

        DirectionalOutput {
            calibrated_magnitude,
            tilt,
            is_moving: calibrated_magnitude.abs() > self.config.deadband,
        }
    }
}
