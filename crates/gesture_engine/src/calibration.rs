//! Calibration state machine.
//!
//! ```text
//! Uncalibrated --start--> Calibrating --finish(ok)--> Calibrated
//!                              |                          |
//!                              +--finish(too few)--> Uncalibrated
//! Calibrated --start--> Calibrating
//! any --reset--> Uncalibrated
//! ```
//!
//! Timing belongs to the caller: the engine only accumulates samples between
//! `start` and `finish`.

use contracts::{CalibrationBaseline, CalibrationConfig, CalibrationState, ContractError, Sample};
use tracing::{debug, info, warn};

use crate::buffer::RollingBuffer;
use crate::stats;

#[derive(Debug)]
pub struct CalibrationEngine {
    config: CalibrationConfig,
    state: CalibrationState,
    samples: RollingBuffer,
    baseline: Option<CalibrationBaseline>,
}

impl CalibrationEngine {
    pub fn new(config: CalibrationConfig) -> Self {
        let samples = RollingBuffer::new(config.max_samples);
        Self {
            config,
            state: CalibrationState::Uncalibrated,
            samples,
            baseline: None,
        }
    }

    /// Begin accumulating. Any previous baseline is discarded.
    pub fn start(&mut self) {
        self.samples.clear();
        self.baseline = None;
        self.state = CalibrationState::Calibrating;
        info!(
            min_samples = self.config.min_samples,
            duration_ms = self.config.duration_ms,
            "Calibration started"
        );
    }

    /// Feed one sample. Returns false (and ignores it) outside `Calibrating`.
    #[inline]
    pub fn accept(&mut self, sample: &Sample) -> bool {
        if self.state != CalibrationState::Calibrating {
            return false;
        }
        self.samples.push(*sample);
        true
    }

    /// Close the accumulation window and compute the baseline
    ///
    /// # Errors
    /// - `CalibrationInactive` when not calibrating
    /// - `CalibrationFailed` when fewer than `min_samples` were collected; the
    ///   state returns to `Uncalibrated`
    pub fn finish(&mut self) -> Result<CalibrationBaseline, ContractError> {
        if self.state != CalibrationState::Calibrating {
            return Err(ContractError::CalibrationInactive);
        }

        let collected = self.samples.len();
        if collected < self.config.min_samples {
            self.samples.clear();
            self.state = CalibrationState::Uncalibrated;
            warn!(
                collected,
                required = self.config.min_samples,
                "Calibration failed, not enough samples"
            );
            return Err(ContractError::CalibrationFailed {
                collected,
                required: self.config.min_samples,
            });
        }

        let baseline = compute_baseline(&self.samples);
        self.samples.clear();
        self.baseline = Some(baseline);
        self.state = CalibrationState::Calibrated;

        info!(
            samples = baseline.sample_count,
            magnitude = baseline.magnitude,
            magnitude_std = baseline.magnitude_std,
            "Calibration complete"
        );
        Ok(baseline)
    }

    /// Back to `Uncalibrated`, dropping samples and baseline
    pub fn reset(&mut self) {
        self.samples.clear();
        self.baseline = None;
        self.state = CalibrationState::Uncalibrated;
        debug!("Calibration reset");
    }

    #[inline]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.state == CalibrationState::Calibrated
    }

    #[inline]
    pub fn is_calibrating(&self) -> bool {
        self.state == CalibrationState::Calibrating
    }

    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.baseline.as_ref()
    }

    /// Baseline, or `UncalibratedAccess`
    pub fn require_baseline(&self) -> Result<&CalibrationBaseline, ContractError> {
        self.baseline.as_ref().ok_or(ContractError::UncalibratedAccess)
    }

    /// Samples gathered so far in the current run
    pub fn collected(&self) -> usize {
        self.samples.len()
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }
}

fn compute_baseline(samples: &RollingBuffer) -> CalibrationBaseline {
    let window = samples.all();
    let magnitudes = window.map(|s| s.accel_magnitude());
    let xs = window.map(|s| s.accel.x);
    let ys = window.map(|s| s.accel.y);
    let zs = window.map(|s| s.accel.z);

    CalibrationBaseline {
        magnitude: stats::mean(&magnitudes),
        magnitude_std: stats::std_dev(&magnitudes),
        accel_mean: [stats::mean(&xs), stats::mean(&ys), stats::mean(&zs)],
        accel_std: [stats::std_dev(&xs), stats::std_dev(&ys), stats::std_dev(&zs)],
        sample_count: window.len(),
    }
}
