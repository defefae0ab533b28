//! Gesture arbitration engine.
//!
//! One `GestureEngine` owns the rolling buffer, the calibration engine and
//! the arbitration state. It is driven by a single task, one sample per
//! cycle, and never blocks or fails: every cycle yields a [`GestureFrame`].

use contracts::{
    CalibrationBaseline, CalibrationState, ClassifierStrategy, ContractError, EngineConfig,
    GestureEvent, GestureFrame, GestureKind, LabeledFeatures, Sample, SamplePacket,
    MAX_BUFFER_CAPACITY, MIN_ANALYSIS_WINDOW,
};
use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use crate::buffer::RollingBuffer;
use crate::calibration::CalibrationEngine;
use crate::classifier::ScaledClassifier;
use crate::detectors;
use crate::directional::DirectionalGenerator;
use crate::features;

/// Cooldown counter and last emitted gesture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbitrationState {
    cooldown: u32,
    last_gesture: Option<GestureKind>,
}

impl ArbitrationState {
    #[inline]
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    #[inline]
    pub fn last_gesture(&self) -> Option<GestureKind> {
        self.last_gesture
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.cooldown == 0
    }

    /// Consume one cooldown cycle. Returns true when the cycle is suppressed.
    fn tick(&mut self) -> bool {
        if self.cooldown == 0 {
            return false;
        }
        self.cooldown -= 1;
        true
    }

    fn arm(&mut self, kind: GestureKind, cooldown: u32) {
        self.cooldown = cooldown;
        self.last_gesture = Some(kind);
    }
}

/// Running counters over the engine's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub cycles: u64,
    pub gestures_emitted: u64,
    /// Cycles skipped because the buffer held fewer than `min_window` samples
    pub warmup_skipped: u64,
    /// Cycles skipped by an active cooldown
    pub cooldown_suppressed: u64,
    pub buffer_evicted: u64,
}

#[derive(Debug)]
pub struct GestureEngine {
    config: EngineConfig,
    buffer: RollingBuffer,
    calibration: CalibrationEngine,
    classifier: ScaledClassifier,
    directional: DirectionalGenerator,
    arbitration: ArbitrationState,
    stats: EngineStats,
}

impl GestureEngine {
    pub fn new(config: EngineConfig) -> Self {
        let capacity = config
            .buffer_capacity
            .clamp(MIN_ANALYSIS_WINDOW, MAX_BUFFER_CAPACITY);

        Self {
            buffer: RollingBuffer::new(capacity),
            calibration: CalibrationEngine::new(config.calibration.clone()),
            classifier: ScaledClassifier::new(config.classifier.clone()),
            directional: DirectionalGenerator::new(config.directional.clone()),
            arbitration: ArbitrationState::default(),
            stats: EngineStats::default(),
            config,
        }
    }

    /// Run one detection cycle for a sample
    #[instrument(
        level = "trace",
        name = "gesture_engine_process",
        skip(self, sample),
        fields(cycle = self.stats.cycles + 1)
    )]
    pub fn process(&mut self, sample: Sample) -> GestureFrame {
        self.stats.cycles += 1;
        metrics::counter!("gesture_cycles_total").increment(1);

        self.calibration.accept(&sample);
        self.buffer.push(sample);
        self.stats.buffer_evicted = self.buffer.evicted();

        let event = self.arbitrate();
        if event.is_gesture() {
            self.stats.gestures_emitted += 1;
            metrics::counter!("gesture_events_total", "gesture" => event.kind.as_str())
                .increment(1);
            info!(
                gesture = %event.kind,
                intensity = event.intensity,
                confidence = event.confidence,
                cooldown = self.arbitration.cooldown,
                "Gesture detected"
            );
        }

        metrics::gauge!("gesture_cooldown").set(self.arbitration.cooldown as f64);
        metrics::gauge!("gesture_buffer_depth").set(self.buffer.len() as f64);

        let directional = self.directional.compute(&sample, self.calibration.baseline());
        let features = self.record_features(&event);

        GestureFrame {
            cycle: self.stats.cycles,
            timestamp: None,
            event,
            directional,
            raw: sample,
            calibration: self.calibration.state(),
            features,
        }
    }

    /// [`process`](Self::process) carrying the packet's timestamp
    pub fn process_packet(&mut self, packet: &SamplePacket) -> GestureFrame {
        let mut frame = self.process(packet.sample);
        frame.timestamp = Some(packet.timestamp);
        frame
    }

    fn arbitrate(&mut self) -> GestureEvent {
        if self.buffer.len() < self.config.min_window {
            self.stats.warmup_skipped += 1;
            trace!(buffered = self.buffer.len(), "Warming up");
            return GestureEvent::none();
        }

        if self.arbitration.tick() {
            self.stats.cooldown_suppressed += 1;
            metrics::counter!("gesture_suppressed_total").increment(1);
            return GestureEvent::none();
        }

        let event = self.evaluate();
        if event.is_gesture() {
            let cooldown = self.config.cooldowns.for_kind(event.kind);
            self.arbitration.arm(event.kind, cooldown);
        }
        event
    }

    fn evaluate(&self) -> GestureEvent {
        if self.config.strategy != ClassifierStrategy::Scaled
            && detectors::tap_pending(&self.buffer.all(), &self.config.thresholds)
        {
            trace!("Tap candidate on newest sample, deferring");
            return GestureEvent::none();
        }

        let heuristic = || {
            detectors::evaluate(
                &self.buffer.all(),
                &self.config.thresholds,
                self.arbitration.last_gesture,
            )
            .map(GestureEvent::from)
        };
        let scaled = || {
            let outcome = self.classifier.classify(&self.buffer);
            trace!(?outcome, "Classifier outcome");
            outcome.event()
        };

        let event = match self.config.strategy {
            ClassifierStrategy::Heuristic => heuristic(),
            ClassifierStrategy::Scaled => scaled(),
            ClassifierStrategy::Hybrid => heuristic()
                .or_else(|| scaled().filter(GestureEvent::is_gesture)),
        };
        event.unwrap_or_else(GestureEvent::none)
    }

    fn record_features(&self, event: &GestureEvent) -> Option<LabeledFeatures> {
        if !self.config.record_features {
            return None;
        }
        let window = self.buffer.all().trailing(self.config.classifier.window);
        let label = self
            .config
            .feature_label
            .clone()
            .unwrap_or_else(|| event.kind.as_str().to_string());
        Some(LabeledFeatures {
            label,
            features: features::extract(&window),
        })
    }

    // Calibration control surface

    /// Begin accumulating a new baseline; the previous one is discarded
    pub fn start_calibration(&mut self) {
        self.calibration.start();
    }

    /// Close calibration and freeze the baseline
    ///
    /// # Errors
    /// `CalibrationInactive` or `CalibrationFailed`, see [`CalibrationEngine::finish`].
    pub fn finish_calibration(&mut self) -> Result<CalibrationBaseline, ContractError> {
        let result = self.calibration.finish();
        let outcome = if result.is_ok() { "ok" } else { "failed" };
        metrics::counter!("calibration_runs_total", "result" => outcome).increment(1);
        result
    }

    /// Same as [`finish_calibration`](Self::finish_calibration)
    pub fn stop_calibration(&mut self) -> Result<CalibrationBaseline, ContractError> {
        self.finish_calibration()
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    /// Frozen baseline
    ///
    /// # Errors
    /// `UncalibratedAccess` before a calibration has completed.
    pub fn calibration(&self) -> Result<&CalibrationBaseline, ContractError> {
        self.calibration.require_baseline()
    }

    /// Samples collected by the calibration in progress
    pub fn calibration_progress(&self) -> usize {
        self.calibration.collected()
    }

    // Introspection

    pub fn cooldown(&self) -> u32 {
        self.arbitration.cooldown
    }

    pub fn last_gesture(&self) -> Option<GestureKind> {
        self.arbitration.last_gesture
    }

    pub fn arbitration(&self) -> ArbitrationState {
        self.arbitration
    }

    pub fn cycle_count(&self) -> u64 {
        self.stats.cycles
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Clear buffer and arbitration state. Calibration is left untouched.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.arbitration = ArbitrationState::default();
        debug!("Engine buffer and arbitration reset");
    }
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
