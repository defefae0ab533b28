//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    /// A recording line could not be decoded
    #[error("{source_id}: line {line}: {message}")]
    ParseFailed {
        source_id: String,
        line: usize,
        message: String,
    },

    /// Recording could not be opened or read
    #[error("failed to read recording {path}: {source}")]
    Recording {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recording contains no samples
    #[error("recording {path} is empty")]
    EmptyRecording { path: PathBuf },

    /// Source configuration cannot be turned into a source
    #[error("source {source_id} misconfigured: {message}")]
    InvalidSource { source_id: String, message: String },

    #[error("source {source_id} is already registered")]
    AlreadyRegistered { source_id: String },
}

impl IngestionError {
    pub fn invalid_source(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSource {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;
