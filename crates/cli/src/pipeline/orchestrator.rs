//! Pipeline orchestrator - wires source, engine and sinks together.
//!
//! The orchestrator is the calibration scheduler: it opens calibration when
//! the run starts and closes it when the timer fires. Every sample goes
//! through exactly one `GestureEngine` owned by this task.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{GestureFrame, GestureProfile};
use gesture_engine::GestureEngine;
use ingestion::{build_source, BackpressureConfig, IngestionPipeline};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::feed::{IngestMode, SampleFeed};
use super::stats::{PipelineStats, StopReason};
use crate::error::CliError;

/// How often the loop checks whether the source has gone away
const LIVENESS_PERIOD: Duration = Duration::from_millis(100);

const FRAME_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub profile: GestureProfile,

    /// Stop after this many gestures
    pub max_events: Option<u64>,

    /// Stop after this long
    pub duration: Option<Duration>,

    /// Calibrate for this long at start
    pub calibrate: Option<Duration>,

    pub mode: IngestMode,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the source is exhausted, a limit is hit or `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let profile = &self.config.profile;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        // Ingestion
        let mut ingestion =
            IngestionPipeline::with_config(BackpressureConfig::from(&profile.source));
        let source = build_source(&profile.source)
            .with_context(|| format!("Failed to build source '{}'", profile.source.id))?;
        ingestion
            .register_source(source, None)
            .context("Failed to register source")?;
        let rx = ingestion
            .take_receiver()
            .ok_or_else(|| CliError::pipeline_execution("ingestion receiver already taken"))?;
        let mut feed = SampleFeed::new(
            self.config.mode,
            profile.source.id.clone(),
            rx,
            ingestion.store(),
            profile.source.rate_hz,
        );

        // Dispatcher
        let (frame_tx, frame_rx) = mpsc::channel::<GestureFrame>(FRAME_CHANNEL_CAPACITY);
        if profile.sinks.is_empty() {
            warn!("No sinks configured - frames are only summarised");
        }
        let dispatcher = dispatcher::create_dispatcher(profile.sinks.clone(), frame_rx)
            .await
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        let mut engine = GestureEngine::new(profile.engine.clone());
        let mut stats = PipelineStats::default();

        info!(
            source = %profile.source.id,
            kind = ?profile.source.kind,
            strategy = ?profile.engine.strategy,
            mode = ?self.config.mode,
            sinks = profile.sinks.len(),
            "Detection loop starting"
        );

        ingestion.start_all();

        let mut calibrating = false;
        if let Some(period) = self.config.calibrate {
            info!(secs = period.as_secs_f64(), "Calibrating, hold the device still");
            engine.start_calibration();
            calibrating = true;
        }

        let calibration_timer = tokio::time::sleep(self.config.calibrate.unwrap_or_default());
        let run_timer = tokio::time::sleep(self.config.duration.unwrap_or_default());
        let mut liveness = tokio::time::interval(LIVENESS_PERIOD);
        tokio::pin!(calibration_timer, run_timer, shutdown);

        stats.stop_reason = loop {
            tokio::select! {
                _ = &mut shutdown => break StopReason::Interrupted,

                _ = &mut run_timer, if self.config.duration.is_some() => break StopReason::Timeout,

                _ = &mut calibration_timer, if calibrating => {
                    calibrating = false;
                    stats.calibration = Some(finish_calibration(&mut engine));
                }

                _ = liveness.tick() => {
                    if !ingestion.is_connected() && feed.is_drained() {
                        break StopReason::SourceExhausted;
                    }
                }

                packet = feed.next() => {
                    let Some(packet) = packet else {
                        break StopReason::SourceExhausted;
                    };

                    let frame = engine.process_packet(&packet);
                    stats.samples_processed += 1;
                    observability::record_gesture_frame(&frame);
                    stats.gestures.update(&frame);

                    if frame.has_gesture() {
                        info!(
                            cycle = frame.cycle,
                            gesture = %frame.event.kind,
                            intensity = frame.event.intensity,
                            confidence = frame.event.confidence,
                            "Gesture"
                        );
                    }

                    if frame_tx.send(frame).await.is_err() {
                        warn!("Dispatcher channel closed");
                        break StopReason::SourceExhausted;
                    }

                    if let Some(max) = self.config.max_events {
                        if stats.gestures_emitted() >= max {
                            info!(events = max, "Reached event limit");
                            break StopReason::MaxEvents;
                        }
                    }
                }
            }
        };

        // A run shorter than the calibration period still closes it
        if calibrating {
            stats.calibration = Some(finish_calibration(&mut engine));
        }

        info!(reason = stats.stop_reason.as_str(), "Shutting down pipeline...");
        ingestion.stop_all();
        drop(frame_tx);

        match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
            Ok(Ok(report)) => stats.sinks = report,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Dispatcher did not flush within 5s"),
        }

        stats.engine = engine.stats();
        stats.ingestion = ingestion.metrics().snapshot();
        observability::record_ingestion_drop_rate(
            &profile.source.id,
            stats.ingestion.samples_received,
            stats.ingestion.samples_dropped,
        );
        stats.duration = start_time.elapsed();

        info!(
            samples = stats.samples_processed,
            gestures = stats.gestures_emitted(),
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

fn finish_calibration(
    engine: &mut GestureEngine,
) -> std::result::Result<contracts::CalibrationBaseline, String> {
    let collected = engine.calibration_progress();
    match engine.finish_calibration() {
        Ok(baseline) => {
            info!(
                magnitude = baseline.magnitude,
                magnitude_std = baseline.magnitude_std,
                samples = baseline.sample_count,
                "Calibration complete"
            );
            observability::record_calibration(&baseline);
            Ok(baseline)
        }
        Err(e) => {
            warn!(collected, error = %e, "Calibration failed, running uncalibrated");
            Err(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GestureKind, Motion, MotionSegment, SinkConfig, SinkType, SourceConfig};
    use std::collections::HashMap;
    use std::path::Path;

    fn mock_profile(script: Vec<MotionSegment>, sink_dir: &Path) -> GestureProfile {
        let mut source = SourceConfig::mock();
        source.script = script;
        source.script_loop = false;
        source.noise = 0.0;
        source.seed = Some(1);
        source.rate_hz = 1000.0;

        GestureProfile {
            version: Default::default(),
            source,
            engine: Default::default(),
            sinks: vec![SinkConfig {
                name: "session".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 4096,
                params: HashMap::from([(
                    "base_path".to_string(),
                    sink_dir.display().to_string(),
                )]),
            }],
        }
    }

    fn segment(motion: Motion, duration_ms: u64) -> MotionSegment {
        MotionSegment {
            motion,
            duration_ms,
        }
    }

    fn config(profile: GestureProfile) -> PipelineConfig {
        PipelineConfig {
            profile,
            max_events: None,
            duration: Some(Duration::from_secs(10)),
            calibrate: None,
            mode: IngestMode::Push,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_run_exhausts_source() {
        let dir = tempfile::tempdir().unwrap();
        let profile = mock_profile(
            // the opening hold and its cooldown are over before the tap
            vec![
                segment(Motion::Rest, 200),
                segment(Motion::Tap, 20),
                segment(Motion::Rest, 100),
            ],
            dir.path(),
        );

        let stats = Pipeline::new(config(profile))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::SourceExhausted);
        assert!(stats.samples_processed > 0);
        assert!(stats.gestures.count(GestureKind::Tap) >= 1);
        assert_eq!(stats.sinks.len(), 1);
        assert!(dir.path().join(dispatcher::FRAMES_FILE).exists());
    }

    #[tokio::test]
    async fn test_max_events_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = mock_profile(
            vec![segment(Motion::Rest, 50), segment(Motion::SpinLeft, 200)],
            dir.path(),
        );
        profile.source.script_loop = true;

        let mut cfg = config(profile);
        cfg.max_events = Some(2);
        let stats = Pipeline::new(cfg).run(std::future::pending()).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxEvents);
        assert_eq!(stats.gestures_emitted(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_signal_interrupts() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = mock_profile(Vec::new(), dir.path());
        profile.source.rate_hz = 100.0;

        let stats = Pipeline::new(config(profile))
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Interrupted);
    }

    #[tokio::test]
    async fn test_short_run_still_closes_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let profile = mock_profile(vec![segment(Motion::Rest, 150)], dir.path());

        let mut cfg = config(profile);
        cfg.calibrate = Some(Duration::from_secs(5));
        let stats = Pipeline::new(cfg).run(std::future::pending()).await.unwrap();

        let baseline = stats.calibration.unwrap().unwrap();
        assert!(baseline.sample_count >= 50);
        assert!((baseline.magnitude - 9.81).abs() < 0.1);
        assert_eq!(stats.engine.cycles, stats.samples_processed);
    }
}
