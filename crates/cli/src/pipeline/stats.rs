//! Run statistics.

use std::time::Duration;

use contracts::CalibrationBaseline;
use dispatcher::MetricsSnapshot as SinkSnapshot;
use gesture_engine::EngineStats;
use ingestion::MetricsSnapshot as IngestionSnapshot;
use observability::GestureMetricsAggregator;

/// Why the detection loop ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    #[default]
    SourceExhausted,
    MaxEvents,
    Timeout,
    Interrupted,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceExhausted => "source exhausted",
            Self::MaxEvents => "event limit reached",
            Self::Timeout => "duration elapsed",
            Self::Interrupted => "interrupted",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub samples_processed: u64,

    pub duration: Duration,

    pub stop_reason: StopReason,

    /// Outcome of the timed calibration, when one was requested
    pub calibration: Option<Result<CalibrationBaseline, String>>,

    pub engine: EngineStats,

    pub ingestion: IngestionSnapshot,

    pub sinks: Vec<(String, SinkSnapshot)>,

    pub gestures: GestureMetricsAggregator,
}

impl PipelineStats {
    /// Samples processed per second
    pub fn rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.samples_processed as f64 / secs
        } else {
            0.0
        }
    }

    pub fn gestures_emitted(&self) -> u64 {
        self.gestures.total_gestures
    }

    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");
        println!("Duration: {:.2}s ({})", self.duration.as_secs_f64(), self.stop_reason.as_str());
        println!("Samples processed: {} ({:.1}/s)", self.samples_processed, self.rate());
        println!(
            "Samples received: {} (dropped {}, {:.2}%)",
            self.ingestion.samples_received,
            self.ingestion.samples_dropped,
            self.ingestion.drop_rate() * 100.0
        );
        println!(
            "Engine: warm-up {} / cooldown {} cycles skipped",
            self.engine.warmup_skipped, self.engine.cooldown_suppressed
        );

        match &self.calibration {
            Some(Ok(baseline)) => println!(
                "Calibration: |g| = {:.3} ± {:.3} over {} samples",
                baseline.magnitude, baseline.magnitude_std, baseline.sample_count
            ),
            Some(Err(message)) => println!("Calibration: failed ({message})"),
            None => println!("Calibration: not requested"),
        }

        if !self.sinks.is_empty() {
            println!("\nSinks:");
            for (name, snapshot) in &self.sinks {
                println!(
                    "  {}: written {} ({} gestures), failed {}, dropped {}, skipped {}",
                    name,
                    snapshot.write_count,
                    snapshot.gesture_count,
                    snapshot.failure_count,
                    snapshot.dropped_count,
                    snapshot.skipped_count
                );
            }
        }

        println!("\n{}", self.gestures.summary());
    }
}
