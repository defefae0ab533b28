//! Gesture metric recording and in-memory aggregation

use std::collections::BTreeMap;

use contracts::{CalibrationBaseline, CalibrationState, GestureFrame, GestureKind};
use metrics::{gauge, histogram};

/// Record the per-frame metrics the engine does not emit itself
///
/// The engine already counts cycles and events; this adds the continuous
/// directional output and classifier confidence.
pub fn record_gesture_frame(frame: &GestureFrame) {
    if frame.calibration == CalibrationState::Calibrated {
        gauge!("gesture_calibrated_magnitude").set(frame.directional.calibrated_magnitude);
        gauge!("gesture_is_moving").set(if frame.directional.is_moving { 1.0 } else { 0.0 });
    }

    if frame.has_gesture() {
        let kind = frame.event.kind.as_str();
        if let Some(intensity) = frame.event.intensity {
            histogram!("gesture_intensity", "gesture" => kind).record(intensity);
        }
        if let Some(confidence) = frame.event.confidence {
            histogram!("gesture_confidence", "gesture" => kind).record(confidence);
        }
    }
}

/// Publish a frozen calibration baseline
///
/// Run counts are emitted by the engine; this exposes the baseline itself.
pub fn record_calibration(baseline: &CalibrationBaseline) {
    gauge!("calibration_baseline_magnitude").set(baseline.magnitude);
    gauge!("calibration_baseline_magnitude_std").set(baseline.magnitude_std);
    gauge!("calibration_samples").set(baseline.sample_count as f64);
}

/// Publish the ingestion drop ratio for a source
pub fn record_ingestion_drop_rate(source_id: &str, received: u64, dropped: u64) {
    gauge!("ingestion_drop_ratio", "source_id" => source_id.to_string())
        .set(percent(dropped, received) / 100.0);
}

/// Aggregates engine frames in memory for the end-of-run summary
#[derive(Debug, Clone, Default)]
pub struct GestureMetricsAggregator {
    pub total_cycles: u64,

    pub total_gestures: u64,

    /// Cycles that ran against a calibration baseline
    pub calibrated_cycles: u64,

    /// Cycles flagged as moving by the directional output
    pub moving_cycles: u64,

    pub counts: BTreeMap<GestureKind, u64>,

    pub intensity_stats: RunningStats,

    pub confidence_stats: RunningStats,

    pub magnitude_stats: RunningStats,

    /// Cycle of the first and latest emitted gesture
    pub first_gesture_cycle: Option<u64>,
    pub last_gesture_cycle: Option<u64>,
}

impl GestureMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, frame: &GestureFrame) {
        self.total_cycles += 1;

        if frame.calibration == CalibrationState::Calibrated {
            self.calibrated_cycles += 1;
            self.magnitude_stats
                .push(frame.directional.calibrated_magnitude.abs());
            if frame.directional.is_moving {
                self.moving_cycles += 1;
            }
        }

        if !frame.has_gesture() {
            return;
        }

        self.total_gestures += 1;
        *self.counts.entry(frame.event.kind).or_insert(0) += 1;
        self.first_gesture_cycle.get_or_insert(frame.cycle);
        self.last_gesture_cycle = Some(frame.cycle);

        if let Some(intensity) = frame.event.intensity {
            self.intensity_stats.push(intensity);
        }
        if let Some(confidence) = frame.event.confidence {
            self.confidence_stats.push(confidence);
        }
    }

    pub fn count(&self, kind: GestureKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> GestureSummary {
        GestureSummary {
            total_cycles: self.total_cycles,
            total_gestures: self.total_gestures,
            calibrated_cycles: self.calibrated_cycles,
            moving_rate: percent(self.moving_cycles, self.calibrated_cycles),
            gesture_rate: percent(self.total_gestures, self.total_cycles),
            counts: self.counts.clone(),
            intensity: StatsSummary::from(&self.intensity_stats),
            confidence: StatsSummary::from(&self.confidence_stats),
            calibrated_magnitude: StatsSummary::from(&self.magnitude_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default)]
pub struct GestureSummary {
    pub total_cycles: u64,
    pub total_gestures: u64,
    pub calibrated_cycles: u64,
    /// Percentage of calibrated cycles flagged as moving
    pub moving_rate: f64,
    /// Percentage of cycles that emitted a gesture
    pub gesture_rate: f64,
    pub counts: BTreeMap<GestureKind, u64>,
    pub intensity: StatsSummary,
    pub confidence: StatsSummary,
    pub calibrated_magnitude: StatsSummary,
}

impl std::fmt::Display for GestureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Gesture Summary ===")?;
        writeln!(f, "Cycles: {}", self.total_cycles)?;
        writeln!(
            f,
            "Gestures: {} ({:.2}% of cycles)",
            self.total_gestures, self.gesture_rate
        )?;
        for (kind, count) in &self.counts {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        writeln!(
            f,
            "Calibrated cycles: {} (moving {:.2}%)",
            self.calibrated_cycles, self.moving_rate
        )?;
        writeln!(f, "Intensity: {}", self.intensity)?;
        writeln!(f, "Confidence: {}", self.confidence)?;
        writeln!(f, "|Calibrated magnitude|: {}", self.calibrated_magnitude)?;
        Ok(())
    }
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (n - 1)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DirectionalOutput, GestureEvent, Sample};

    fn make_frame(cycle: u64, event: GestureEvent, calibration: CalibrationState) -> GestureFrame {
        GestureFrame {
            cycle,
            timestamp: None,
            event,
            directional: DirectionalOutput {
                calibrated_magnitude: -1.5,
                tilt: [0.0; 3],
                is_moving: true,
            },
            raw: Sample::at_rest(),
            calibration,
            features: None,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = GestureMetricsAggregator::new();

        aggregator.update(&make_frame(
            1,
            GestureEvent::none(),
            CalibrationState::Uncalibrated,
        ));
        aggregator.update(&make_frame(
            2,
            GestureEvent::new(GestureKind::TapHard).with_confidence(0.85),
            CalibrationState::Calibrated,
        ));
        aggregator.update(&make_frame(
            9,
            GestureEvent::new(GestureKind::StrokeUp)
                .with_intensity(100.0)
                .with_confidence(0.7),
            CalibrationState::Calibrated,
        ));

        assert_eq!(aggregator.total_cycles, 3);
        assert_eq!(aggregator.total_gestures, 2);
        assert_eq!(aggregator.calibrated_cycles, 2);
        assert_eq!(aggregator.count(GestureKind::TapHard), 1);
        assert_eq!(aggregator.count(GestureKind::Hold), 0);
        assert_eq!(aggregator.first_gesture_cycle, Some(2));
        assert_eq!(aggregator.last_gesture_cycle, Some(9));
        assert_eq!(aggregator.intensity_stats.count(), 1);
        assert_eq!(aggregator.confidence_stats.count(), 2);
        assert!((aggregator.magnitude_stats.mean() - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = GestureMetricsAggregator::new();
        for cycle in 1..=4 {
            let event = if cycle == 4 {
                GestureEvent::new(GestureKind::SpinLeft)
            } else {
                GestureEvent::none()
            };
            aggregator.update(&make_frame(cycle, event, CalibrationState::Uncalibrated));
        }

        let output = aggregator.summary().to_string();
        assert!(output.contains("Cycles: 4"));
        assert!(output.contains("25.00%"));
        assert!(output.contains("spin_left: 1"));
        assert!(output.contains("Intensity: N/A"));
    }
}
