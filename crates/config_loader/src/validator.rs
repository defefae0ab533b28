//! Profile validation
//!
//! Field ranges come from the `Validate` derives on the contract types.
//! Rules spanning several fields:
//! - every detector window fits in the rolling buffer
//! - `min_window` and the classifier window fit in the rolling buffer
//! - calibration `min_samples <= max_samples`
//! - stretch delta band is non-empty
//! - replay sources name a recording
//! - sink names are non-empty and unique

use std::collections::HashSet;

use contracts::{ContractError, GestureProfile, SourceKind};
use validator::Validate;

/// Validate a parsed profile, returning the first violation found
pub fn validate(profile: &GestureProfile) -> Result<(), ContractError> {
    validate_fields(profile)?;
    validate_windows(profile)?;
    validate_calibration(profile)?;
    validate_stretch_band(profile)?;
    validate_source(profile)?;
    validate_sinks(profile)?;
    Ok(())
}

fn validate_fields(profile: &GestureProfile) -> Result<(), ContractError> {
    profile
        .validate()
        .map_err(|e| ContractError::config_validation("profile", e.to_string()))
}

fn validate_windows(profile: &GestureProfile) -> Result<(), ContractError> {
    let engine = &profile.engine;
    let capacity = engine.buffer_capacity;

    if engine.min_window > capacity {
        return Err(ContractError::config_validation(
            "engine.min_window",
            format!(
                "min_window ({}) exceeds buffer_capacity ({capacity})",
                engine.min_window
            ),
        ));
    }

    let longest = engine.thresholds.max_window();
    if longest > capacity {
        return Err(ContractError::config_validation(
            "engine.thresholds",
            format!("detector window of {longest} exceeds buffer_capacity ({capacity})"),
        ));
    }

    let classifier = &engine.classifier;
    if classifier.window > capacity || classifier.min_samples > capacity {
        return Err(ContractError::config_validation(
            "engine.classifier",
            format!(
                "classifier window ({}) and min_samples ({}) must fit in buffer_capacity ({capacity})",
                classifier.window, classifier.min_samples
            ),
        ));
    }

    Ok(())
}

fn validate_calibration(profile: &GestureProfile) -> Result<(), ContractError> {
    let calibration = &profile.engine.calibration;
    if calibration.min_samples > calibration.max_samples {
        return Err(ContractError::config_validation(
            "engine.calibration.min_samples / engine.calibration.max_samples",
            format!(
                "min_samples ({}) must be <= max_samples ({})",
                calibration.min_samples, calibration.max_samples
            ),
        ));
    }
    Ok(())
}

fn validate_stretch_band(profile: &GestureProfile) -> Result<(), ContractError> {
    let t = &profile.engine.thresholds;
    if t.stretch_delta_min >= t.stretch_delta_max {
        return Err(ContractError::config_validation(
            "engine.thresholds.stretch_delta_min / engine.thresholds.stretch_delta_max",
            format!(
                "stretch_delta_min ({}) must be < stretch_delta_max ({})",
                t.stretch_delta_min, t.stretch_delta_max
            ),
        ));
    }
    Ok(())
}

fn validate_source(profile: &GestureProfile) -> Result<(), ContractError> {
    let source = &profile.source;
    if source.kind == SourceKind::Replay && source.replay_path.is_none() {
        return Err(ContractError::config_validation(
            "source.replay_path",
            "replay sources require replay_path",
        ));
    }
    if let Some(idx) = source.script.iter().position(|s| s.duration_ms == 0) {
        return Err(ContractError::config_validation(
            format!("source.script[{idx}].duration_ms"),
            "segment duration must be > 0",
        ));
    }
    Ok(())
}

fn validate_sinks(profile: &GestureProfile) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in profile.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, EngineConfig, Motion, MotionSegment, SinkConfig, SinkType, SourceConfig,
    };

    fn minimal_profile() -> GestureProfile {
        GestureProfile {
            version: ConfigVersion::V1,
            source: SourceConfig::mock(),
            engine: EngineConfig::default(),
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 100,
                params: Default::default(),
            }],
        }
    }

    fn expect_err(profile: &GestureProfile, needle: &str) {
        let err = validate(profile).unwrap_err().to_string();
        assert!(err.contains(needle), "got: {err}");
    }

    #[test]
    fn test_valid_profile() {
        assert!(validate(&minimal_profile()).is_ok());
    }

    #[test]
    fn test_field_range_violation() {
        let mut profile = minimal_profile();
        profile.source.rate_hz = 0.0;
        expect_err(&profile, "rate_hz");
    }

    #[test]
    fn test_detector_window_exceeds_capacity() {
        let mut profile = minimal_profile();
        profile.engine.buffer_capacity = 10;
        profile.engine.classifier.window = 10;
        profile.engine.classifier.min_samples = 10;
        // hold_window defaults to 20
        expect_err(&profile, "detector window of 20");
    }

    #[test]
    fn test_min_window_exceeds_capacity() {
        let mut profile = minimal_profile();
        profile.engine.min_window = 60;
        expect_err(&profile, "min_window (60)");
    }

    #[test]
    fn test_classifier_window_exceeds_capacity() {
        let mut profile = minimal_profile();
        profile.engine.classifier.window = 80;
        expect_err(&profile, "classifier window (80)");
    }

    #[test]
    fn test_calibration_bounds() {
        let mut profile = minimal_profile();
        profile.engine.calibration.min_samples = 500;
        expect_err(&profile, "min_samples (500)");
    }

    #[test]
    fn test_stretch_band() {
        let mut profile = minimal_profile();
        profile.engine.thresholds.stretch_delta_min = 20.0;
        expect_err(&profile, "stretch_delta_min");
    }

    #[test]
    fn test_replay_requires_path() {
        let mut profile = minimal_profile();
        profile.source.kind = SourceKind::Replay;
        expect_err(&profile, "replay_path");
    }

    #[test]
    fn test_zero_length_segment() {
        let mut profile = minimal_profile();
        profile.source.script = vec![MotionSegment {
            motion: Motion::Tap,
            duration_ms: 0,
        }];
        expect_err(&profile, "script[0]");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut profile = minimal_profile();
        profile.sinks[0].name = String::new();
        expect_err(&profile, "cannot be empty");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut profile = minimal_profile();
        profile.sinks.push(profile.sinks[0].clone());
        expect_err(&profile, "duplicate sink name");
    }
}
