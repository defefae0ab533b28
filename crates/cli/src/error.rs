//! Error types for CLI operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Profile not found: {path}")]
    ConfigNotFound { path: String },

    /// Profile no longer valid after command-line overrides
    #[error("Invalid override: {message}")]
    InvalidOverride { message: String },

    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_override(message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            message: message.into(),
        }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}

/// Fail early with a typed error when the profile path does not exist
pub fn ensure_config_exists(path: &std::path::Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::config_not_found(path.display().to_string()))
    }
}
