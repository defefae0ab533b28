//! GestureProfile - Config Loader output
//!
//! Describes one complete run: where samples come from, how the engine is
//! tuned, and where frames go.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

use crate::EngineConfig;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GestureProfile {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sample source
    #[validate(nested)]
    pub source: SourceConfig,

    /// Engine tuning
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Sample source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Source identifier used in logs and packets
    #[serde(default = "default_source_id")]
    #[validate(length(min = 1))]
    pub id: String,

    pub kind: SourceKind,

    /// Nominal sample rate (Hz), must be > 0
    #[serde(default = "default_rate_hz")]
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub rate_hz: f64,

    /// Ingestion channel capacity
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,

    /// What to drop when the engine falls behind
    #[serde(default)]
    pub drop_policy: DropPolicy,

    /// Recording to play back (replay only)
    #[serde(default)]
    pub replay_path: Option<PathBuf>,

    /// Playback speed multiplier (1.0 = recorded speed)
    #[serde(default = "default_replay_speed")]
    #[validate(range(exclusive_min = 0.0))]
    pub replay_speed: f64,

    /// Restart the recording when it ends
    #[serde(default)]
    pub replay_loop: bool,

    /// Scripted motion (mock only); empty means rest forever
    #[serde(default)]
    pub script: Vec<MotionSegment>,

    /// Repeat the script when it ends (mock only)
    #[serde(default = "default_true")]
    pub script_loop: bool,

    /// Gaussian-ish noise amplitude added to every axis (mock only)
    #[serde(default = "default_noise")]
    #[validate(range(min = 0.0))]
    pub noise: f64,

    /// RNG seed for reproducible mock streams
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_source_id() -> String {
    "imu".to_string()
}

fn default_rate_hz() -> f64 {
    100.0
}

fn default_channel_capacity() -> usize {
    256
}

fn default_replay_speed() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_noise() -> f64 {
    0.02
}

impl SourceConfig {
    /// Mock source at 100 Hz with no script
    pub fn mock() -> Self {
        Self {
            id: default_source_id(),
            kind: SourceKind::Mock,
            rate_hz: default_rate_hz(),
            channel_capacity: default_channel_capacity(),
            drop_policy: DropPolicy::default(),
            replay_path: None,
            replay_speed: default_replay_speed(),
            replay_loop: false,
            script: Vec::new(),
            script_loop: true,
            noise: default_noise(),
            seed: None,
        }
    }
}

/// Source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Synthetic scripted stream
    Mock,
    /// JSONL recording
    Replay,
}

/// One step of a mock motion script
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSegment {
    pub motion: Motion,
    /// Length in milliseconds
    pub duration_ms: u64,
}

/// Motion patterns the mock source can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    /// Still, gravity on +Z
    Rest,
    /// Single sharp accel spike in the middle of the segment
    Tap,
    /// Rapid small accel oscillation
    Flutter,
    /// Slow steady accel ramp
    Stretch,
    /// Alternating rotation about X
    WaveHorizontal,
    /// Alternating rotation about Y
    WaveVertical,
    /// Steady positive rotation about Z
    SpinLeft,
    /// Steady negative rotation about Z
    SpinRight,
}

/// Drop policy (when the ingestion channel is full)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Evict the oldest queued sample to make room
    #[default]
    DropOldest,
    /// Discard the incoming sample
    DropNewest,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    256
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// tracing output
    Log,
    /// JSONL files
    File,
    /// UDP datagrams
    Network,
}
