//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{GestureProfile, SinkType, SourceKind};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ProfileSummary>,
}

#[derive(Serialize)]
struct ProfileSummary {
    version: String,
    source_id: String,
    source_kind: String,
    rate_hz: f64,
    strategy: String,
    buffer_capacity: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating profile");

    let result = validate_profile(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Profile validation failed")
    }
}

fn validate_profile(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(profile) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&profile),
            summary: Some(ProfileSummary {
                version: format!("{:?}", profile.version),
                source_id: profile.source.id.clone(),
                source_kind: format!("{:?}", profile.source.kind),
                rate_hz: profile.source.rate_hz,
                strategy: format!("{:?}", profile.engine.strategy),
                buffer_capacity: profile.engine.buffer_capacity,
                sink_count: profile.sinks.len(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Things that load fine but are probably not what the author meant
fn collect_warnings(profile: &GestureProfile) -> Vec<String> {
    let mut warnings = Vec::new();

    if profile.sinks.is_empty() {
        warnings.push("No sinks configured - frames will be discarded".to_string());
    }

    if profile.source.kind == SourceKind::Mock && profile.source.script.is_empty() {
        warnings.push("Mock source has no script - the stream will stay at rest".to_string());
    }

    if profile.source.kind == SourceKind::Replay && !profile.source.script.is_empty() {
        warnings.push("Motion script is ignored by replay sources".to_string());
    }

    let has_file_sink = profile.sinks.iter().any(|s| s.sink_type == SinkType::File);
    if profile.engine.record_features && !has_file_sink {
        warnings.push("record_features is set but no file sink will persist the rows".to_string());
    }

    if profile.engine.feature_label.is_some() && !profile.engine.record_features {
        warnings.push("feature_label has no effect without record_features".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Profile is valid: {}", result.config_path);

        if let Some(summary) = &result.summary {
            println!("\nSummary:");
            println!("  Version:  {}", summary.version);
            println!(
                "  Source:   {} ({}, {} Hz)",
                summary.source_id, summary.source_kind, summary.rate_hz
            );
            println!("  Strategy: {}", summary.strategy);
            println!("  Buffer:   {} samples", summary.buffer_capacity);
            println!("  Sinks:    {}", summary.sink_count);
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &result.warnings {
                println!("  ⚠ {}", warning);
            }
        }
    } else {
        println!("✗ Profile is invalid: {}", result.config_path);
        if let Some(error) = &result.error {
            println!("\nError: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_profile(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: PathBuf::from("/nonexistent/gesture.toml"),
            json: true,
        };
        let result = validate_profile(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_profile_with_warnings() {
        let file = write_profile(
            r#"
[source]
kind = "mock"

[engine]
record_features = true
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_profile(&args);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 3);
        assert_eq!(result.summary.unwrap().sink_count, 0);
    }

    #[test]
    fn test_invalid_profile() {
        let file = write_profile(
            r#"
[source]
kind = "replay"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        let result = validate_profile(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("replay_path"));
    }
}
