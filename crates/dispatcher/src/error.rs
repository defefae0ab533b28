//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink parameter missing or malformed
    #[error("invalid parameter '{param}' for sink '{name}': {message}")]
    InvalidParam {
        name: String,
        param: String,
        message: String,
    },

    #[error("duplicate sink name '{0}'")]
    DuplicateSink(String),

    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_param(
        name: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParam {
            name: name.into(),
            param: param.into(),
            message: message.into(),
        }
    }
}
