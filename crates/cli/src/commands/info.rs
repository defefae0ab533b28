//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use contracts::{CooldownConfig, GestureProfile, GestureThresholds};

use crate::cli::InfoArgs;

/// Profile info for JSON output
#[derive(Serialize)]
struct ProfileInfo {
    version: String,
    source: SourceInfo,
    engine: EngineInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thresholds: Option<GestureThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cooldowns: Option<CooldownConfig>,
}

#[derive(Serialize)]
struct SourceInfo {
    id: String,
    kind: String,
    rate_hz: f64,
    channel_capacity: usize,
    drop_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    script: Vec<String>,
}

#[derive(Serialize)]
struct EngineInfo {
    strategy: String,
    buffer_capacity: usize,
    min_window: usize,
    max_detector_window: usize,
    calibration_ms: u64,
    deadband: f64,
    record_features: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_label: Option<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading profile info");

    if !args.config.exists() {
        anyhow::bail!("Profile not found: {}", args.config.display());
    }

    let profile = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load profile from {}", args.config.display()))?;

    if args.json {
        let info = build_profile_info(&profile, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize profile info")?;
        println!("{}", json);
    } else {
        print_profile_info(&profile, args);
    }

    Ok(())
}

fn build_profile_info(profile: &GestureProfile, args: &InfoArgs) -> ProfileInfo {
    let source = &profile.source;
    let engine = &profile.engine;

    ProfileInfo {
        version: format!("{:?}", profile.version),
        source: SourceInfo {
            id: source.id.clone(),
            kind: format!("{:?}", source.kind),
            rate_hz: source.rate_hz,
            channel_capacity: source.channel_capacity,
            drop_policy: format!("{:?}", source.drop_policy),
            replay_path: source.replay_path.as_ref().map(|p| p.display().to_string()),
            script: source
                .script
                .iter()
                .map(|seg| format!("{:?} {}ms", seg.motion, seg.duration_ms))
                .collect(),
        },
        engine: EngineInfo {
            strategy: format!("{:?}", engine.strategy),
            buffer_capacity: engine.buffer_capacity,
            min_window: engine.min_window,
            max_detector_window: engine.thresholds.max_window(),
            calibration_ms: engine.calibration.duration_ms,
            deadband: engine.directional.deadband,
            record_features: engine.record_features,
            feature_label: engine.feature_label.clone(),
        },
        sinks: profile
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect(),
        thresholds: args.thresholds.then(|| engine.thresholds.clone()),
        cooldowns: args.thresholds.then(|| engine.cooldowns.clone()),
    }
}

fn print_profile_info(profile: &GestureProfile, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Gesture Profile                             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let source = &profile.source;
    println!("Source");
    println!("  ID:        {}", source.id);
    println!("  Kind:      {:?}", source.kind);
    println!("  Rate:      {} Hz", source.rate_hz);
    println!(
        "  Channel:   {} ({:?})",
        source.channel_capacity, source.drop_policy
    );
    if let Some(path) = &source.replay_path {
        let looping = if source.replay_loop { ", looping" } else { "" };
        println!(
            "  Recording: {} (x{}{})",
            path.display(),
            source.replay_speed,
            looping
        );
    }
    for seg in &source.script {
        println!("    {:?} for {} ms", seg.motion, seg.duration_ms);
    }

    let engine = &profile.engine;
    println!("\nEngine");
    println!("  Strategy:    {:?}", engine.strategy);
    println!(
        "  Buffer:      {} (min window {}, longest detector {})",
        engine.buffer_capacity,
        engine.min_window,
        engine.thresholds.max_window()
    );
    println!("  Calibration: {} ms", engine.calibration.duration_ms);
    println!("  Deadband:    {} m/s²", engine.directional.deadband);

    if args.thresholds {
        let t = &engine.thresholds;
        println!("\nThresholds");
        println!(
            "  tap:     window {}  peak > {}  ratio {}",
            t.tap_window, t.tap_threshold, t.tap_peak_ratio
        );
        println!(
            "  flutter: window {}  variance > {}  mean < {}",
            t.flutter_window, t.flutter_variance_min, t.flutter_mean_max
        );
        println!(
            "  stretch: window {}  delta {}..{}  gyro < {}",
            t.stretch_window, t.stretch_delta_min, t.stretch_delta_max, t.stretch_gyro_max
        );
        println!(
            "  wave:    window {}  floor {}  reversals >= {}  sum > {}",
            t.wave_window, t.wave_gyro_floor, t.wave_min_reversals, t.wave_sum_min
        );
        println!(
            "  spin:    window {}  |mean| > {}",
            t.spin_window, t.spin_mean_min
        );
        println!(
            "  hold:    window {}  accel var < {}  gyro var < {}",
            t.hold_window, t.hold_accel_variance_max, t.hold_gyro_variance_max
        );

        let c = &engine.cooldowns;
        println!(
            "\nCooldowns (cycles): tap {} flutter {} stretch {} wave {} spin {} hold {} stroke {}",
            c.tap, c.flutter, c.stretch, c.wave, c.spin, c.hold, c.stroke
        );
    }

    if !profile.sinks.is_empty() {
        println!("\nSinks");
        for sink in &profile.sinks {
            println!(
                "  {} ({:?}, queue {})",
                sink.name, sink.sink_type, sink.queue_capacity
            );
            for (k, v) in &sink.params {
                println!("    {} = {}", k, v);
            }
        }
    }
    println!();
}
