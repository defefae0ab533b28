//! Mock IMU source
//!
//! Synthesises a scripted stream of motions for testing without hardware.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{
    Motion, MotionSegment, Sample, SampleCallback, SamplePacket, SensorSource, SourceConfig,
    Vector3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

const GRAVITY: f64 = 9.81;
const TAP_PEAK: f64 = 25.0;
const FLUTTER_AMPLITUDE: f64 = 2.5;
const STRETCH_SLOPE: f64 = 0.8;
const STRETCH_STEPS: u64 = 10;
const WAVE_RATE: f64 = 150.0;
const WAVE_PERIOD: f64 = 10.0;
const SPIN_RATE: f64 = 120.0;
const MAG_FIELD: Vector3 = Vector3::new(22.0, 5.0, -40.0);

/// Mock IMU source configuration
#[derive(Debug, Clone)]
pub struct MockImuConfig {
    pub source_id: String,
    pub rate_hz: f64,
    pub script: Vec<MotionSegment>,
    pub looping: bool,
    /// Uniform noise amplitude on every axis
    pub noise: f64,
    pub seed: Option<u64>,
}

impl Default for MockImuConfig {
    fn default() -> Self {
        Self {
            source_id: "imu".to_string(),
            rate_hz: 100.0,
            script: Vec::new(),
            looping: true,
            noise: 0.02,
            seed: None,
        }
    }
}

impl From<&SourceConfig> for MockImuConfig {
    fn from(source: &SourceConfig) -> Self {
        Self {
            source_id: source.id.clone(),
            rate_hz: source.rate_hz,
            script: source.script.clone(),
            looping: source.script_loop,
            noise: source.noise,
            seed: source.seed,
        }
    }
}

/// Deterministic (given a seed) sample generator following a motion script.
///
/// An empty script yields rest samples forever. A non-looping script ends
/// after its last segment.
pub struct MotionGenerator {
    script: Vec<MotionSegment>,
    looping: bool,
    rate_hz: f64,
    noise: f64,
    rng: StdRng,
    segment: usize,
    step: u64,
}

impl MotionGenerator {
    pub fn new(config: &MockImuConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            script: config.script.clone(),
            looping: config.looping,
            rate_hz: config.rate_hz.max(1.0),
            noise: config.noise.max(0.0),
            rng,
            segment: 0,
            step: 0,
        }
    }

    /// Samples spanned by a segment at the configured rate (at least one)
    pub fn segment_len(&self, segment: &MotionSegment) -> u64 {
        ((segment.duration_ms as f64 * self.rate_hz / 1000.0).round() as u64).max(1)
    }

    fn current(&mut self) -> Option<(Motion, u64, u64)> {
        if self.script.is_empty() {
            return Some((Motion::Rest, self.step, u64::MAX));
        }
        loop {
            if self.segment >= self.script.len() {
                if !self.looping {
                    return None;
                }
                self.segment = 0;
            }
            let segment = self.script[self.segment];
            let len = self.segment_len(&segment);
            if self.step < len {
                return Some((segment.motion, self.step, len));
            }
            self.segment += 1;
            self.step = 0;
        }
    }

    fn jitter(&mut self) -> f64 {
        if self.noise > 0.0 {
            self.rng.random_range(-self.noise..=self.noise)
        } else {
            0.0
        }
    }

    fn noisy(&mut self, v: Vector3) -> Vector3 {
        Vector3::new(
            v.x + self.jitter(),
            v.y + self.jitter(),
            v.z + self.jitter(),
        )
    }
}

/// Noise-free sample for step `k` of a `len`-sample motion
pub fn synthesize(motion: Motion, k: u64, len: u64) -> Sample {
    let mut accel = Vector3::new(0.0, 0.0, GRAVITY);
    let mut gyro = Vector3::default();
    let phase = (TAU * k as f64 / WAVE_PERIOD).sin();

    match motion {
        Motion::Rest => {}
        Motion::Tap => {
            if k == len / 2 {
                accel.z += TAP_PEAK;
            }
        }
        Motion::Flutter => {
            accel.z += if k % 2 == 0 {
                FLUTTER_AMPLITUDE
            } else {
                -FLUTTER_AMPLITUDE
            };
        }
        Motion::Stretch => accel.z += STRETCH_SLOPE * k.min(STRETCH_STEPS) as f64,
        Motion::WaveHorizontal => gyro.x = WAVE_RATE * phase,
        Motion::WaveVertical => gyro.y = WAVE_RATE * phase,
        Motion::SpinLeft => gyro.z = SPIN_RATE,
        Motion::SpinRight => gyro.z = -SPIN_RATE,
    }

    Sample::new(accel, gyro, MAG_FIELD)
}

impl Iterator for MotionGenerator {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let (motion, k, len) = self.current()?;
        self.step += 1;
        let clean = synthesize(motion, k, len);
        Some(Sample::new(
            self.noisy(clean.accel),
            self.noisy(clean.gyro),
            self.noisy(clean.mag),
        ))
    }
}

/// Mock IMU source
///
/// Produces samples on its own thread at `rate_hz`.
pub struct MockImuSource {
    config: MockImuConfig,
    listening: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
}

impl MockImuSource {
    pub fn new(config: MockImuConfig) -> Self {
        Self {
            config,
            listening: Arc::new(AtomicBool::new(false)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_source_config(source: &SourceConfig) -> Self {
        Self::new(MockImuConfig::from(source))
    }

    pub fn config(&self) -> &MockImuConfig {
        &self.config
    }
}

impl SensorSource for MockImuSource {
    fn source_id(&self) -> &str {
        &self.config.source_id
    }

    fn listen(&self, callback: SampleCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let listening = self.listening.clone();
        let connected = self.connected.clone();
        connected.store(true, Ordering::SeqCst);

        thread::spawn(move || {
            let interval = Duration::from_secs_f64(1.0 / config.rate_hz.max(1.0));
            let mut generator = MotionGenerator::new(&config);
            let mut sequence = 0u64;

            debug!(
                source_id = %config.source_id,
                rate_hz = config.rate_hz,
                segments = config.script.len(),
                "mock imu source started"
            );

            while listening.load(Ordering::Relaxed) {
                let Some(sample) = generator.next() else {
                    debug!(source_id = %config.source_id, "mock script finished");
                    break;
                };
                callback(SamplePacket {
                    source_id: config.source_id.clone(),
                    timestamp: sequence as f64 / config.rate_hz,
                    sequence,
                    sample,
                });
                trace!(source_id = %config.source_id, sequence, "mock sample");
                sequence += 1;
                thread::sleep(interval);
            }

            connected.store(false, Ordering::SeqCst);
            debug!(source_id = %config.source_id, sent = sequence, "mock imu source stopped");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
