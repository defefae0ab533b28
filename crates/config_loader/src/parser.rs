//! Profile parsing
//!
//! TOML is the primary format; JSON is accepted for generated profiles.

use contracts::{ContractError, GestureProfile};

/// Profile file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<GestureProfile, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<GestureProfile, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<GestureProfile, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ClassifierStrategy, Motion, SourceKind};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[source]
kind = "mock"
"#;
        let profile = parse_toml(content).unwrap();
        assert_eq!(profile.source.kind, SourceKind::Mock);
        assert_eq!(profile.engine.buffer_capacity, 50);
        assert!(profile.sinks.is_empty());
    }

    #[test]
    fn test_parse_toml_overrides() {
        let content = r#"
[source]
kind = "mock"
seed = 7
script = [
    { motion = "rest", duration_ms = 500 },
    { motion = "tap", duration_ms = 100 },
]

[engine]
strategy = "hybrid"

[engine.thresholds]
tap_threshold = 15.0

[engine.cooldowns]
tap = 4
"#;
        let profile = parse_toml(content).unwrap();
        assert_eq!(profile.source.seed, Some(7));
        assert_eq!(profile.source.script.len(), 2);
        assert_eq!(profile.source.script[1].motion, Motion::Tap);
        assert_eq!(profile.engine.strategy, ClassifierStrategy::Hybrid);
        assert_eq!(profile.engine.thresholds.tap_threshold, 15.0);
        // untouched siblings keep their defaults
        assert_eq!(profile.engine.thresholds.tap_window, 5);
        assert_eq!(profile.engine.cooldowns.tap, 4);
        assert_eq!(profile.engine.cooldowns.hold, 50);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "source": { "kind": "replay", "replay_path": "session/frames.jsonl" },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let profile = parse_json(content).unwrap();
        assert_eq!(profile.source.kind, SourceKind::Replay);
        assert_eq!(profile.sinks[0].queue_capacity, 256);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let content = r#"
[source]
kind = "mock"
[engine]
strategy = "neural"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
