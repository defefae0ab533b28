//! Layered error definitions
//!
//! Categorized by source: engine / calibration / config / source / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Engine Errors =====
    /// Window requested from a buffer that holds fewer samples
    #[error("insufficient data: window of {required} requested, {available} buffered")]
    InsufficientData { required: usize, available: usize },

    // ===== Calibration Errors =====
    /// Calibration finished with too few samples
    #[error("calibration failed: collected {collected} samples, need at least {required}")]
    CalibrationFailed { collected: usize, required: usize },

    /// finish() called while no calibration is running
    #[error("calibration is not running")]
    CalibrationInactive,

    /// Baseline requested before a calibration completed
    #[error("no calibration baseline available")]
    UncalibratedAccess,

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Sample source could not be opened or is gone
    #[error("source '{source_id}' unavailable: {message}")]
    SourceUnavailable { source_id: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create insufficient data error
    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source unavailable error
    pub fn source_unavailable(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_failed_message() {
        let err = ContractError::CalibrationFailed {
            collected: 12,
            required: 50,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"), "got: {msg}");
        assert!(msg.contains("50"), "got: {msg}");
    }

    #[test]
    fn test_config_validation_message() {
        let err = ContractError::config_validation("engine.buffer_capacity", "must be >= 5");
        assert_eq!(
            err.to_string(),
            "config validation error at 'engine.buffer_capacity': must be >= 5"
        );
    }
}
