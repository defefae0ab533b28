//! # Gesture Engine
//!
//! Streaming gesture detection over 9-axis IMU samples.
//!
//! - rolling sample buffer with borrowed trailing windows
//! - per-window statistics and 27-value feature vectors
//! - heuristic detector bank and scaled feature classifier
//! - cooldown arbitration, calibration and directional output
//!
//! ## Usage
//!
//! ```ignore
//! use gesture_engine::{EngineConfig, GestureEngine};
//!
//! let mut engine = GestureEngine::new(EngineConfig::default());
//! engine.start_calibration();
//! // ... feed still samples for the calibration period ...
//! engine.finish_calibration()?;
//!
//! for sample in samples {
//!     let frame = engine.process(sample);
//!     if frame.has_gesture() {
//!         println!("{}", frame.event.kind);
//!     }
//! }
//! ```

pub mod buffer;
pub mod calibration;
pub mod classifier;
pub mod detectors;
pub mod directional;
mod engine;
pub mod features;
pub mod stats;

pub use buffer::{RollingBuffer, Window};
pub use calibration::CalibrationEngine;
pub use classifier::{ClassifierOutcome, ScaledClassifier};
pub use detectors::{Detection, Detector};
pub use directional::DirectionalGenerator;
pub use engine::{ArbitrationState, EngineStats, GestureEngine};

pub use contracts::{
    CalibrationBaseline, CalibrationState, ClassifierStrategy, EngineConfig, GestureEvent,
    GestureFrame, GestureKind, GestureThresholds, Sample,
};
