//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the IMU
//! sample model, gesture outputs, calibration types, configuration and the
//! source/sink traits. Business crates depend on this crate only, never the
//! other way round.
//!
//! ## Units
//! - accelerometer: m/s², gravity included
//! - gyroscope: deg/s
//! - magnetometer: µT
//!
//! ## Time Model
//! The detection cycle is clocked by sample arrival (~100 Hz). Timestamps are
//! seconds since the source started (`f64`) and are carried for transport and
//! replay only; no detector reads them.

mod calibration;
mod engine_config;
mod error;
mod gesture;
mod profile;
mod sample;
mod sensor_source;
mod sink;

pub use calibration::*;
pub use engine_config::*;
pub use error::*;
pub use gesture::*;
pub use profile::*;
pub use sample::*;
pub use sensor_source::{SampleCallback, SensorSource};
pub use sink::*;
