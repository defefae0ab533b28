//! # Ingestion Pipeline
//!
//! Sample ingestion module.
//!
//! Responsibilities:
//! - Register sample sources (mock, replay, device threads)
//! - Backpressure management and drop policy
//! - Send to the detection loop via async-channel
//! - Publish the latest sample to a shared [`SampleStore`] for polling
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{build_source, IngestionPipeline, BackpressureConfig};
//!
//! let mut pipeline = IngestionPipeline::with_config(BackpressureConfig::from(&profile.source));
//! pipeline.register_source(build_source(&profile.source)?, None)?;
//!
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start_all();
//! while let Ok(packet) = rx.recv().await {
//!     let frame = engine.process_packet(&packet);
//! }
//! ```

mod adapter;
mod config;
mod error;
mod factory;
mod mock;
mod pipeline;
mod replay;
mod store;

pub use adapter::SourceAdapter;
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::SamplePacket;
pub use error::{IngestionError, Result};
pub use factory::build_source;
pub use mock::{synthesize, MockImuConfig, MockImuSource, MotionGenerator};
pub use pipeline::IngestionPipeline;
pub use replay::{load_recording, RecordedSample, ReplayConfig, ReplaySource};
pub use store::{SampleStore, StoreSnapshot};
