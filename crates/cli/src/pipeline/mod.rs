//! Detection loop orchestration.

mod feed;
mod orchestrator;
mod stats;

pub use feed::IngestMode;
pub use orchestrator::{Pipeline, PipelineConfig};
