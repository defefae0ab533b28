//! Scaled feature classifier.
//!
//! A fixed rule set over normalised window features. Nothing here is
//! trained; the scaler constants and splits are hand-tuned for a device at
//! rest reading roughly (0, 0, 9.81) m/s².

use contracts::{Axis, ClassifierConfig, FeatureVector, GestureEvent, GestureKind, FEATURE_COUNT};

use crate::buffer::{RollingBuffer, Window};
use crate::features;
use crate::stats;

pub const TAP_HARD_CONFIDENCE: f64 = 0.85;
pub const TAP_SOFT_CONFIDENCE: f64 = 0.75;
pub const STROKE_CONFIDENCE: f64 = 0.7;
pub const NONE_CONFIDENCE: f64 = 0.9;

/// Per-feature centre, `[mean, variance, energy]` per axis
#[rustfmt::skip]
pub const SCALER_MEAN: [f64; FEATURE_COUNT] = [
    // accel x, y, z
    0.0, 0.5, 10.0,
    0.0, 0.5, 10.0,
    9.81, 0.5, 1925.0,
    // gyro x, y, z
    0.0, 50.0, 1000.0,
    0.0, 50.0, 1000.0,
    0.0, 50.0, 1000.0,
    // mag x, y, z
    0.0, 1.0, 100.0,
    0.0, 1.0, 100.0,
    0.0, 1.0, 100.0,
];

/// Per-feature scale, same layout as [`SCALER_MEAN`]
#[rustfmt::skip]
pub const SCALER_SCALE: [f64; FEATURE_COUNT] = [
    2.0, 2.0, 50.0,
    2.0, 2.0, 50.0,
    2.0, 2.0, 400.0,
    60.0, 400.0, 20000.0,
    60.0, 400.0, 20000.0,
    60.0, 400.0, 20000.0,
    50.0, 10.0, 5000.0,
    50.0, 10.0, 5000.0,
    50.0, 10.0, 5000.0,
];

const ACCEL_AXES: [Axis; 3] = [Axis::AccelX, Axis::AccelY, Axis::AccelZ];

/// Classifier result. `NotReady` is distinct from a "no gesture" prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifierOutcome {
    NotReady { buffered: usize, required: usize },
    Prediction(GestureEvent),
}

impl ClassifierOutcome {
    pub fn event(&self) -> Option<GestureEvent> {
        match self {
            ClassifierOutcome::Prediction(event) => Some(*event),
            ClassifierOutcome::NotReady { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ClassifierOutcome::Prediction(_))
    }
}

/// `(feature - mean) / scale`, elementwise
pub fn normalize(features: &FeatureVector) -> FeatureVector {
    let mut out = [0.0; FEATURE_COUNT];
    for (i, value) in out.iter_mut().enumerate() {
        *value = (features.0[i] - SCALER_MEAN[i]) / SCALER_SCALE[i];
    }
    FeatureVector(out)
}

#[derive(Debug, Clone)]
pub struct ScaledClassifier {
    config: ClassifierConfig,
}

impl ScaledClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the trailing `window` samples of the buffer
    pub fn classify(&self, buffer: &RollingBuffer) -> ClassifierOutcome {
        let buffered = buffer.len();
        if buffered < self.config.min_samples {
            return ClassifierOutcome::NotReady {
                buffered,
                required: self.config.min_samples,
            };
        }
        let window = buffer.all().trailing(self.config.window);
        ClassifierOutcome::Prediction(self.classify_window(&window))
    }

    /// Decision procedure over an already sliced window
    pub fn classify_window(&self, window: &Window<'_>) -> GestureEvent {
        let raw = features::extract(window);
        self.decide(&raw, &normalize(&raw))
    }

    fn decide(&self, raw: &FeatureVector, scaled: &FeatureVector) -> GestureEvent {
        let accel_variance: f64 = ACCEL_AXES.iter().map(|a| scaled.variance(*a)).sum();
        if accel_variance > self.config.tap_variance_split {
            let accel_energy: f64 = ACCEL_AXES.iter().map(|a| scaled.energy(*a)).sum();
            return if accel_energy > self.config.hard_energy_split {
                GestureEvent::new(GestureKind::TapHard).with_confidence(TAP_HARD_CONFIDENCE)
            } else {
                GestureEvent::new(GestureKind::TapSoft).with_confidence(TAP_SOFT_CONFIDENCE)
            };
        }

        let gx = raw.mean(Axis::GyroX);
        let gy = raw.mean(Axis::GyroY);
        let gz = raw.mean(Axis::GyroZ);
        let gyro = stats::magnitude(gx, gy, gz);
        if gyro > self.config.stroke_gyro_split {
            let kind = if gx.abs() >= gy.abs() {
                if gx >= 0.0 {
                    GestureKind::StrokeUp
                } else {
                    GestureKind::StrokeDown
                }
            } else if gy >= 0.0 {
                GestureKind::StrokeRight
            } else {
                GestureKind::StrokeLeft
            };
            return GestureEvent::new(kind)
                .with_intensity(gyro)
                .with_confidence(STROKE_CONFIDENCE);
        }

        GestureEvent::none().with_confidence(NONE_CONFIDENCE)
    }
}

impl Default for ScaledClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Sample, Vector3};

    fn make_buffer(samples: &[Sample]) -> RollingBuffer {
        let mut buffer = RollingBuffer::new(50);
        for s in samples {
            buffer.push(*s);
        }
        buffer
    }

    fn spike_window(peak: f64) -> Vec<Sample> {
        let mut samples = vec![Sample::at_rest(); 20];
        samples[10].accel = Vector3::new(0.0, 0.0, peak);
        samples
    }

    fn rotating(x: f64, y: f64) -> Vec<Sample> {
        vec![
            Sample::new(
                Vector3::new(0.0, 0.0, 9.81),
                Vector3::new(x, y, 0.0),
                Vector3::default()
            );
            20
        ]
    }

    fn kind_of(samples: &[Sample]) -> GestureKind {
        ScaledClassifier::default()
            .classify(&make_buffer(samples))
            .event()
            .unwrap()
            .kind
    }

    #[test]
    fn test_not_ready_below_min_samples() {
        let outcome = ScaledClassifier::default().classify(&make_buffer(&[Sample::at_rest(); 19]));
        assert_eq!(
            outcome,
            ClassifierOutcome::NotReady {
                buffered: 19,
                required: 20
            }
        );
        assert!(!outcome.is_ready());
    }

    #[test]
    fn test_rest_is_confident_none() {
        let event = ScaledClassifier::default()
            .classify(&make_buffer(&[Sample::at_rest(); 20]))
            .event()
            .unwrap();
        assert_eq!(event.kind, GestureKind::None);
        assert_eq!(event.confidence, Some(NONE_CONFIDENCE));
    }

    #[test]
    fn test_normalize_rest_accel_z() {
        let samples = [Sample::at_rest(); 20];
        let scaled = normalize(&features::extract(&Window::from_slice(&samples)));
        assert!(scaled.mean(Axis::AccelZ).abs() < 1e-12);
        assert!((scaled.variance(Axis::AccelX) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_soft_and_hard_taps() {
        assert_eq!(kind_of(&spike_window(30.0)), GestureKind::TapSoft);
        assert_eq!(kind_of(&spike_window(50.0)), GestureKind::TapHard);
    }

    #[test]
    fn test_stroke_directions() {
        assert_eq!(kind_of(&rotating(100.0, 0.0)), GestureKind::StrokeUp);
        assert_eq!(kind_of(&rotating(-100.0, 0.0)), GestureKind::StrokeDown);
        assert_eq!(kind_of(&rotating(0.0, 100.0)), GestureKind::StrokeRight);
        assert_eq!(kind_of(&rotating(0.0, -100.0)), GestureKind::StrokeLeft);
    }

    #[test]
    fn test_stroke_tie_prefers_x() {
        assert_eq!(kind_of(&rotating(80.0, -80.0)), GestureKind::StrokeUp);
    }

    #[test]
    fn test_slow_rotation_is_none() {
        assert_eq!(kind_of(&rotating(30.0, 20.0)), GestureKind::None);
    }

    #[test]
    fn test_uses_trailing_window_only() {
        let mut samples = spike_window(50.0);
        samples.extend(vec![Sample::at_rest(); 20]);
        assert_eq!(kind_of(&samples), GestureKind::None);
    }
}
