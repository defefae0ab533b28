//! Gesture outputs - engine to transport

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CalibrationState, Sample};

/// Number of values in a [`FeatureVector`]: 9 axes × (mean, variance, energy)
pub const FEATURE_COUNT: usize = 27;

/// Recognised gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// No gesture this cycle
    #[default]
    None,
    Tap,
    TapSoft,
    TapHard,
    StrokeUp,
    StrokeDown,
    StrokeLeft,
    StrokeRight,
    Stretch,
    Flutter,
    WaveHorizontal,
    WaveVertical,
    Hold,
    /// Counter-clockwise about Z
    SpinLeft,
    /// Clockwise about Z
    SpinRight,
}

impl GestureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GestureKind::None => "none",
            GestureKind::Tap => "tap",
            GestureKind::TapSoft => "tap_soft",
            GestureKind::TapHard => "tap_hard",
            GestureKind::StrokeUp => "stroke_up",
            GestureKind::StrokeDown => "stroke_down",
            GestureKind::StrokeLeft => "stroke_left",
            GestureKind::StrokeRight => "stroke_right",
            GestureKind::Stretch => "stretch",
            GestureKind::Flutter => "flutter",
            GestureKind::WaveHorizontal => "wave_horizontal",
            GestureKind::WaveVertical => "wave_vertical",
            GestureKind::Hold => "hold",
            GestureKind::SpinLeft => "spin_left",
            GestureKind::SpinRight => "spin_right",
        }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == GestureKind::None
    }

    pub fn is_tap(self) -> bool {
        matches!(
            self,
            GestureKind::Tap | GestureKind::TapSoft | GestureKind::TapHard
        )
    }

    pub fn is_stroke(self) -> bool {
        matches!(
            self,
            GestureKind::StrokeUp
                | GestureKind::StrokeDown
                | GestureKind::StrokeLeft
                | GestureKind::StrokeRight
        )
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete gesture output of one detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureKind,

    /// Detector-specific strength (peak magnitude, variance, summed rate...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,

    /// Classifier confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl GestureEvent {
    /// NO_GESTURE
    pub const fn none() -> Self {
        Self {
            kind: GestureKind::None,
            intensity: None,
            confidence: None,
        }
    }

    pub const fn new(kind: GestureKind) -> Self {
        Self {
            kind,
            intensity: None,
            confidence: None,
        }
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[inline]
    pub fn is_gesture(&self) -> bool {
        !self.kind.is_none()
    }
}

/// Per-window summary: for each axis in `Axis::ALL` order, `[mean, variance, energy]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub const fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    #[inline]
    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn mean(&self, axis: crate::Axis) -> f64 {
        self.0[axis.index() * 3]
    }

    pub fn variance(&self, axis: crate::Axis) -> f64 {
        self.0[axis.index() * 3 + 1]
    }

    pub fn energy(&self, axis: crate::Axis) -> f64 {
        self.0[axis.index() * 3 + 2]
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Feature vector tagged with a label, the shape used for supervised logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeatures {
    pub label: String,
    pub features: FeatureVector,
}

/// Continuous output derived from the latest sample and the calibration baseline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectionalOutput {
    /// |accel| minus the baseline magnitude
    pub calibrated_magnitude: f64,

    /// Per-axis normalised deviation from baseline, clamped to [-1, 1]
    pub tilt: [f64; 3],

    /// |calibrated_magnitude| above the deadband
    pub is_moving: bool,
}

impl DirectionalOutput {
    /// Output used while no baseline exists
    pub const fn neutral() -> Self {
        Self {
            calibrated_magnitude: 0.0,
            tilt: [0.0; 3],
            is_moving: false,
        }
    }
}

/// Everything the engine produces for one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureFrame {
    /// Detection cycle counter (1-based)
    pub cycle: u64,

    /// Source timestamp, when the sample arrived with one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,

    pub event: GestureEvent,

    pub directional: DirectionalOutput,

    /// Raw passthrough
    pub raw: Sample,

    pub calibration: CalibrationState,

    /// Present when feature recording is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<LabeledFeatures>,
}

impl GestureFrame {
    #[inline]
    pub fn has_gesture(&self) -> bool {
        self.event.is_gesture()
    }
}
