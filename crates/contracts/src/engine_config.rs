//! Gesture engine configuration contracts that can be shared across crates.
//!
//! Every struct deserializes with defaults for missing fields, so a profile
//! only needs to name the values it changes.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::GestureKind;

/// Smallest buffer that can satisfy the shortest detector window
pub const MIN_ANALYSIS_WINDOW: usize = 5;

/// Largest rolling buffer the engine accepts
pub const MAX_BUFFER_CAPACITY: usize = 200;

/// Which decision path turns windows into gestures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierStrategy {
    /// Heuristic detector bank only
    #[default]
    Heuristic,
    /// Scaled feature classifier only
    Scaled,
    /// Detector bank first, classifier when nothing fired
    Hybrid,
}

/// Gesture engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Rolling buffer capacity (samples)
    #[validate(range(min = 5, max = 200))]
    pub buffer_capacity: usize,

    /// Cycles with fewer buffered samples emit nothing
    #[validate(range(min = 1, max = 200))]
    pub min_window: usize,

    pub strategy: ClassifierStrategy,

    /// Attach a labelled feature vector to every frame
    pub record_features: bool,

    /// Fixed label for recorded features; the emitted gesture name otherwise
    pub feature_label: Option<String>,

    #[validate(nested)]
    pub thresholds: GestureThresholds,

    pub cooldowns: CooldownConfig,

    #[validate(nested)]
    pub classifier: ClassifierConfig,

    #[validate(nested)]
    pub calibration: CalibrationConfig,

    #[validate(nested)]
    pub directional: DirectionalConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 50,
            min_window: MIN_ANALYSIS_WINDOW,
            strategy: ClassifierStrategy::default(),
            record_features: false,
            feature_label: None,
            thresholds: GestureThresholds::default(),
            cooldowns: CooldownConfig::default(),
            classifier: ClassifierConfig::default(),
            calibration: CalibrationConfig::default(),
            directional: DirectionalConfig::default(),
        }
    }
}

/// Heuristic detector thresholds.
///
/// Units: m/s² for acceleration, deg/s for rotation rate. Windows are sample
/// counts at ~100 Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GestureThresholds {
    #[validate(range(min = 3))]
    pub tap_window: usize,
    /// Peak accel magnitude a tap must exceed
    #[validate(range(exclusive_min = 0.0))]
    pub tap_threshold: f64,
    /// Peak must be at least this multiple of both neighbours
    #[validate(range(min = 1.0))]
    pub tap_peak_ratio: f64,

    #[validate(range(min = 2))]
    pub flutter_window: usize,
    /// Accel magnitude variance above which the device is fluttering
    #[validate(range(exclusive_min = 0.0))]
    pub flutter_variance_min: f64,
    /// Mean accel magnitude ceiling, keeps single impacts out
    #[validate(range(exclusive_min = 0.0))]
    pub flutter_mean_max: f64,

    #[validate(range(min = 2))]
    pub stretch_window: usize,
    /// First-to-last accel magnitude change
    #[validate(range(exclusive_min = 0.0))]
    pub stretch_delta_min: f64,
    /// Changes above this are impacts, not stretches
    #[validate(range(exclusive_min = 0.0))]
    pub stretch_delta_max: f64,
    /// Mean gyro magnitude must stay below this
    #[validate(range(exclusive_min = 0.0))]
    pub stretch_gyro_max: f64,

    #[validate(range(min = 3))]
    pub wave_window: usize,
    /// Rotation rate under which samples are ignored for reversal counting
    #[validate(range(min = 0.0))]
    pub wave_gyro_floor: f64,
    #[validate(range(min = 1))]
    pub wave_min_reversals: usize,
    /// Summed |rate| over the window
    #[validate(range(exclusive_min = 0.0))]
    pub wave_sum_min: f64,

    #[validate(range(min = 2))]
    pub spin_window: usize,
    /// |mean| Z rotation rate
    #[validate(range(exclusive_min = 0.0))]
    pub spin_mean_min: f64,

    #[validate(range(min = 2))]
    pub hold_window: usize,
    /// Sum of accel axis variances
    #[validate(range(exclusive_min = 0.0))]
    pub hold_accel_variance_max: f64,
    /// Sum of gyro axis variances
    #[validate(range(exclusive_min = 0.0))]
    pub hold_gyro_variance_max: f64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            tap_window: 5,
            tap_threshold: 12.0,
            tap_peak_ratio: 2.0,

            flutter_window: 10,
            flutter_variance_min: 3.0,
            flutter_mean_max: 11.0,

            stretch_window: 10,
            stretch_delta_min: 6.0,
            stretch_delta_max: 15.0,
            stretch_gyro_max: 30.0,

            wave_window: 15,
            wave_gyro_floor: 50.0,
            wave_min_reversals: 2,
            wave_sum_min: 600.0,

            spin_window: 10,
            spin_mean_min: 90.0,

            hold_window: 20,
            hold_accel_variance_max: 0.05,
            hold_gyro_variance_max: 4.0,
        }
    }
}

impl GestureThresholds {
    /// Longest window any detector reads
    pub fn max_window(&self) -> usize {
        [
            self.tap_window,
            self.flutter_window,
            self.stretch_window,
            self.wave_window,
            self.spin_window,
            self.hold_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Cycles suppressed after each gesture family fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub tap: u32,
    pub flutter: u32,
    pub stretch: u32,
    pub wave: u32,
    pub spin: u32,
    pub hold: u32,
    pub stroke: u32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            tap: 10,
            flutter: 20,
            stretch: 25,
            wave: 30,
            spin: 30,
            hold: 50,
            stroke: 15,
        }
    }
}

impl CooldownConfig {
    /// Cooldown armed when `kind` is emitted
    pub fn for_kind(&self, kind: GestureKind) -> u32 {
        match kind {
            GestureKind::None => 0,
            GestureKind::Tap | GestureKind::TapSoft | GestureKind::TapHard => self.tap,
            GestureKind::StrokeUp
            | GestureKind::StrokeDown
            | GestureKind::StrokeLeft
            | GestureKind::StrokeRight => self.stroke,
            GestureKind::Stretch => self.stretch,
            GestureKind::Flutter => self.flutter,
            GestureKind::WaveHorizontal | GestureKind::WaveVertical => self.wave,
            GestureKind::Hold => self.hold,
            GestureKind::SpinLeft | GestureKind::SpinRight => self.spin,
        }
    }
}

/// Scaled feature classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Trailing samples fed to the classifier
    #[validate(range(min = 2, max = 200))]
    pub window: usize,
    /// Fewer buffered samples than this yields NotReady
    #[validate(range(min = 2, max = 200))]
    pub min_samples: usize,
    /// Summed normalised accel variance above which the window is a tap
    pub tap_variance_split: f64,
    /// Summed normalised accel energy separating hard from soft taps
    pub hard_energy_split: f64,
    /// Raw gyro mean magnitude (deg/s) above which the window is a stroke
    #[validate(range(exclusive_min = 0.0))]
    pub stroke_gyro_split: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window: 20,
            min_samples: 20,
            tap_variance_split: 6.0,
            hard_energy_split: 3.0,
            stroke_gyro_split: 60.0,
        }
    }
}

/// Calibration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CalibrationConfig {
    /// How long the scheduler keeps calibration open
    #[validate(range(min = 100))]
    pub duration_ms: u64,
    /// Fewer samples than this fails calibration
    #[validate(range(min = 2))]
    pub min_samples: usize,
    /// Accumulation buffer capacity; older samples are evicted
    #[validate(range(min = 2))]
    pub max_samples: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            min_samples: 50,
            max_samples: 400,
        }
    }
}

/// Directional output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DirectionalConfig {
    /// |calibrated magnitude| above this marks the device as moving (m/s²)
    #[validate(range(min = 0.0))]
    pub deadband: f64,
    /// Floor for the per-axis deviation used to normalise tilt
    #[validate(range(exclusive_min = 0.0))]
    pub min_std: f64,
}

impl Default for DirectionalConfig {
    fn default() -> Self {
        Self {
            deadband: 0.5,
            min_std: 0.01,
        }
    }
}
