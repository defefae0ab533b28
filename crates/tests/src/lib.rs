//! # Integration Tests
//!
//! Cross-crate tests that need no hardware:
//! - contract snapshots
//! - profile -> engine wiring
//! - scripted mock stream -> engine -> dispatcher -> file sink
//! - replay of a recorded frame log

#[cfg(test)]
mod contract_tests {
    use contracts::{GestureEvent, GestureKind};

    #[test]
    fn test_gesture_names_are_stable() {
        assert_eq!(GestureKind::SpinLeft.as_str(), "spin_left");
        assert_eq!(GestureKind::WaveHorizontal.as_str(), "wave_horizontal");
        let json = serde_json::to_value(GestureEvent::new(GestureKind::TapHard)).unwrap();
        assert_eq!(json["kind"], "tap_hard");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        GestureFrame, GestureKind, Motion, MotionSegment, Sample, SinkConfig, SinkType,
    };
    use dispatcher::{create_dispatcher, SessionManifest, FRAMES_FILE, MANIFEST_FILE};
    use gesture_engine::{EngineConfig, GestureEngine};
    use ingestion::{load_recording, MockImuConfig, MotionGenerator};
    use observability::GestureMetricsAggregator;
    use tokio::sync::mpsc;

    fn segment(motion: Motion, duration_ms: u64) -> MotionSegment {
        MotionSegment {
            motion,
            duration_ms,
        }
    }

    /// Noise-free, finite sample stream
    fn scripted(rate_hz: f64, script: Vec<MotionSegment>) -> Vec<Sample> {
        let config = MockImuConfig {
            source_id: "mock".to_string(),
            rate_hz,
            script,
            looping: false,
            noise: 0.0,
            seed: Some(7),
        };
        MotionGenerator::new(&config).collect()
    }

    fn run_engine(config: EngineConfig, samples: &[Sample]) -> Vec<GestureFrame> {
        let mut engine = GestureEngine::new(config);
        samples.iter().map(|s| engine.process(*s)).collect()
    }

    fn gestures(frames: &[GestureFrame]) -> Vec<(u64, GestureKind)> {
        frames
            .iter()
            .filter(|f| f.has_gesture())
            .map(|f| (f.cycle, f.event.kind))
            .collect()
    }

    /// Profile loaded from TOML drives the engine: a spin after a long rest
    #[test]
    fn test_profile_to_engine_spin() {
        let profile = ConfigLoader::load_from_str(
            r#"
[source]
kind = "mock"
rate_hz = 100.0
script_loop = false
noise = 0.0
script = [
    { motion = "rest", duration_ms = 800 },
    { motion = "spin_left", duration_ms = 200 },
]

[engine]
strategy = "heuristic"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let samples = scripted(
            profile.source.rate_hz,
            profile.source.script.clone(),
        );
        assert_eq!(samples.len(), 100);

        let frames = run_engine(profile.engine.clone(), &samples);
        let kinds: Vec<GestureKind> = gestures(&frames).into_iter().map(|(_, k)| k).collect();
        assert!(kinds.contains(&GestureKind::SpinLeft), "got {kinds:?}");
        assert!(!kinds.contains(&GestureKind::SpinRight));
    }

    /// Mock script -> engine -> dispatcher -> file sink, then replay the log
    #[tokio::test]
    async fn test_e2e_file_sink_and_replay() {
        let dir = tempfile::tempdir().unwrap();
        let samples = scripted(
            1000.0,
            vec![
                segment(Motion::Rest, 200),
                segment(Motion::Tap, 20),
                segment(Motion::Rest, 100),
            ],
        );
        assert_eq!(samples.len(), 320);

        let frames = run_engine(EngineConfig::default(), &samples);
        let emitted = gestures(&frames);
        assert!(
            emitted.iter().any(|(_, k)| *k == GestureKind::Tap),
            "got {emitted:?}"
        );

        let (tx, rx) = mpsc::channel::<GestureFrame>(64);
        let sinks = vec![
            SinkConfig {
                name: "recorder".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 1024,
                params: HashMap::from([(
                    "base_path".to_string(),
                    dir.path().display().to_string(),
                )]),
            },
            SinkConfig {
                name: "events".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 1024,
                params: HashMap::from([("events_only".to_string(), "true".to_string())]),
            },
        ];
        let dispatcher = create_dispatcher(sinks, rx).await.unwrap();
        let handle = dispatcher.spawn();

        let mut aggregator = GestureMetricsAggregator::new();
        for frame in &frames {
            aggregator.update(frame);
            tx.send(frame.clone()).await.unwrap();
        }
        drop(tx);

        let report: HashMap<String, _> = handle.await.unwrap().into_iter().collect();
        assert_eq!(report["recorder"].write_count, 320);
        assert_eq!(report["recorder"].dropped_count, 0);
        assert_eq!(report["events"].write_count, emitted.len() as u64);
        assert_eq!(report["recorder"].gesture_count, emitted.len() as u64);
        assert_eq!(report["events"].skipped_count, 320 - emitted.len() as u64);
        let taps = emitted.iter().filter(|(_, k)| *k == GestureKind::Tap).count();
        assert_eq!(aggregator.count(GestureKind::Tap), taps as u64);
        assert_eq!(aggregator.summary().total_gestures, emitted.len() as u64);

        let manifest: SessionManifest =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(manifest.frames, 320);
        assert_eq!(manifest.gestures, emitted.len() as u64);
        assert!(manifest.finished_at.is_some());

        assert_replay_matches(&dir.path().join(FRAMES_FILE), &emitted);
    }

    /// A fresh engine fed the recorded raw samples makes the same decisions
    fn assert_replay_matches(log: &Path, expected: &[(u64, GestureKind)]) {
        let records = load_recording(log, "replay").unwrap();
        assert_eq!(records.len(), 320);

        let samples: Vec<Sample> = records.iter().map(|r| r.raw).collect();
        let replayed = run_engine(EngineConfig::default(), &samples);
        assert_eq!(gestures(&replayed), expected);
    }
}
