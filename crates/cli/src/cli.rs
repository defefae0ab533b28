//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// gesturectl - streaming IMU gesture detection
#[derive(Parser, Debug)]
#[command(
    name = "gesturectl",
    author,
    version,
    about = "Streaming IMU gesture detection engine",
    long_about = "Runs the gesture engine against a mock or replayed IMU stream.\n\n\
                  Loads a profile, optionally calibrates against the first seconds of \n\
                  the stream, and fans gesture frames out to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "GESTURECTL_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "GESTURECTL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the detection loop
    Run(RunArgs),

    /// Validate a profile without running
    Validate(ValidateArgs),

    /// Display profile information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to profile file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "gesture.toml",
        env = "GESTURECTL_CONFIG"
    )]
    pub config: PathBuf,

    /// Replay a JSONL recording instead of the profile's source
    #[arg(long, env = "GESTURECTL_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier
    #[arg(long)]
    pub replay_speed: Option<f64>,

    /// Restart the recording when it ends
    #[arg(long)]
    pub replay_loop: bool,

    /// Override the profile's classifier strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Calibrate for the profile's calibration duration before detecting
    #[arg(long)]
    pub calibrate: bool,

    /// Calibrate for this many seconds before detecting
    #[arg(long, value_name = "SECS", conflicts_with = "calibrate")]
    pub calibrate_secs: Option<f64>,

    /// Record labelled feature vectors with every frame
    #[arg(long, value_name = "LABEL")]
    pub record_label: Option<String>,

    /// How the detection loop reads samples
    #[arg(long, value_enum, default_value = "push", env = "GESTURECTL_MODE")]
    pub mode: IngestModeArg,

    /// Stop after this many gestures (0 = unlimited)
    #[arg(long, default_value = "0", env = "GESTURECTL_MAX_EVENTS")]
    pub max_events: u64,

    /// Stop after this many seconds (0 = no limit)
    #[arg(long, default_value = "0", env = "GESTURECTL_DURATION")]
    pub duration_secs: u64,

    /// Prometheus exporter port (0 = disabled)
    #[arg(long, default_value = "0", env = "GESTURECTL_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate the profile with overrides applied and exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[arg(short, long, default_value = "gesture.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[arg(short, long, default_value = "gesture.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detector thresholds and cooldowns
    #[arg(long)]
    pub thresholds: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    Heuristic,
    Scaled,
    Hybrid,
}

impl From<StrategyArg> for contracts::ClassifierStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Heuristic => Self::Heuristic,
            StrategyArg::Scaled => Self::Scaled,
            StrategyArg::Hybrid => Self::Hybrid,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IngestModeArg {
    /// Consume every queued sample
    #[default]
    Push,
    /// Sample the latest value from the shared store at the source rate
    Poll,
}
