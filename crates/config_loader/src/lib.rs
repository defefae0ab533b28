//! # Config Loader
//!
//! Loads a [`GestureProfile`] from TOML or JSON and validates it.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let profile = ConfigLoader::load_from_path(Path::new("gesture.toml")).unwrap();
//! println!("source: {}", profile.source.id);
//! ```

mod parser;
mod validator;

pub use contracts::GestureProfile;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Profile loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a profile from a file path
    ///
    /// The format follows the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<GestureProfile, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a profile from a string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<GestureProfile, ContractError> {
        let profile = parser::parse(content, format)?;
        validator::validate(&profile)?;
        Ok(profile)
    }

    /// Validate a profile built in code
    pub fn validate(profile: &GestureProfile) -> Result<(), ContractError> {
        validator::validate(profile)
    }

    pub fn to_toml(profile: &GestureProfile) -> Result<String, ContractError> {
        toml::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(profile: &GestureProfile) -> Result<String, ContractError> {
        serde_json::to_string_pretty(profile)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ClassifierStrategy, SinkType};

    const PROFILE_TOML: &str = r#"
[source]
id = "wrist"
kind = "mock"
rate_hz = 100.0
seed = 42
script = [
    { motion = "rest", duration_ms = 1000 },
    { motion = "wave_horizontal", duration_ms = 300 },
]

[engine]
buffer_capacity = 60
strategy = "hybrid"
record_features = true
feature_label = "wave"

[[sinks]]
name = "console"
sink_type = "log"

[[sinks]]
name = "session"
sink_type = "file"
params = { base_path = "./out", events_only = "true" }
"#;

    #[test]
    fn test_load_from_str_toml() {
        let profile = ConfigLoader::load_from_str(PROFILE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(profile.source.id, "wrist");
        assert_eq!(profile.engine.strategy, ClassifierStrategy::Hybrid);
        assert_eq!(profile.sinks[1].sink_type, SinkType::File);
        assert_eq!(profile.sinks[1].params["events_only"], "true");
    }

    #[test]
    fn test_round_trip_toml() {
        let profile = ConfigLoader::load_from_str(PROFILE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&profile).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(profile.engine, again.engine);
        assert_eq!(profile.source.script, again.source.script);
        assert_eq!(profile.sinks.len(), again.sinks.len());
    }

    #[test]
    fn test_round_trip_json() {
        let profile = ConfigLoader::load_from_str(PROFILE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&profile).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(profile.engine, again.engine);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[source]
kind = "mock"

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "log"
sink_type = "file"
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let err = ConfigLoader::load_from_path(Path::new("profile.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
