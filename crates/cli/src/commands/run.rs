//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use contracts::{GestureProfile, SourceKind};

use crate::cli::{IngestModeArg, RunArgs};
use crate::error::{ensure_config_exists, CliError};
use crate::pipeline::{IngestMode, Pipeline, PipelineConfig};

pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading profile");
    ensure_config_exists(&args.config)?;

    let mut profile = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load profile from {}", args.config.display()))?;

    apply_overrides(&mut profile, args)?;

    info!(
        source = %profile.source.id,
        kind = ?profile.source.kind,
        strategy = ?profile.engine.strategy,
        buffer = profile.engine.buffer_capacity,
        sinks = profile.sinks.len(),
        "Profile loaded"
    );

    if args.dry_run {
        info!("Dry run mode - profile is valid, exiting");
        print_profile_summary(&profile);
        return Ok(());
    }

    let calibrate = if args.calibrate {
        Some(Duration::from_millis(profile.engine.calibration.duration_ms))
    } else {
        args.calibrate_secs
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64)
    };

    let pipeline = Pipeline::new(PipelineConfig {
        profile,
        max_events: (args.max_events > 0).then_some(args.max_events),
        duration: (args.duration_secs > 0).then(|| Duration::from_secs(args.duration_secs)),
        calibrate,
        mode: match args.mode {
            IngestModeArg::Push => IngestMode::Push,
            IngestModeArg::Poll => IngestMode::Poll,
        },
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        samples = stats.samples_processed,
        gestures = stats.gestures_emitted(),
        rate = format!("{:.1}", stats.rate()),
        reason = stats.stop_reason.as_str(),
        "Run finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides and re-validate the result
fn apply_overrides(profile: &mut GestureProfile, args: &RunArgs) -> Result<(), CliError> {
    if let Some(path) = &args.replay {
        info!(path = %path.display(), "Overriding source with replay");
        profile.source.kind = SourceKind::Replay;
        profile.source.replay_path = Some(path.clone());
    }
    if let Some(speed) = args.replay_speed {
        profile.source.replay_speed = speed;
    }
    if args.replay_loop {
        profile.source.replay_loop = true;
    }
    if let Some(strategy) = args.strategy {
        info!(?strategy, "Overriding classifier strategy");
        profile.engine.strategy = strategy.into();
    }
    if let Some(label) = &args.record_label {
        profile.engine.record_features = true;
        profile.engine.feature_label = Some(label.clone());
        if !profile.sinks.iter().any(|s| s.sink_type == contracts::SinkType::File) {
            warn!("Recording features without a file sink - rows will not be persisted");
        }
    }

    config_loader::ConfigLoader::validate(profile)
        .map_err(|e| CliError::invalid_override(e.to_string()))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping pipeline...");
}

fn print_profile_summary(profile: &GestureProfile) {
    println!("\n=== Profile Summary ===\n");
    let source = &profile.source;
    println!("Source: {} ({:?}, {} Hz)", source.id, source.kind, source.rate_hz);
    if let Some(path) = &source.replay_path {
        println!("  Recording: {} (x{})", path.display(), source.replay_speed);
    }
    if !source.script.is_empty() {
        println!("  Script: {} segments", source.script.len());
    }

    let engine = &profile.engine;
    println!("\nEngine:");
    println!("  Strategy: {:?}", engine.strategy);
    println!("  Buffer: {} samples (min window {})", engine.buffer_capacity, engine.min_window);
    if engine.record_features {
        println!(
            "  Recording features: {}",
            engine.feature_label.as_deref().unwrap_or("<gesture name>")
        );
    }

    if !profile.sinks.is_empty() {
        println!("\nSinks ({}):", profile.sinks.len());
        for sink in &profile.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }
    println!();
}
