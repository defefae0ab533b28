//! # Dispatcher
//!
//! Output fan-out for engine frames.
//!
//! Responsibilities:
//! - Consume `GestureFrame`s from the detection loop
//! - Fan out to log, file and network sinks
//! - Isolate slow sinks behind bounded queues so detection never blocks

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{GestureFrame, GestureSink};
pub use dispatcher::{create_dispatcher, create_sink_handle, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::{FrameFilter, SinkHandle};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{
    FileSink, FileSinkConfig, GestureDatagram, LogSink, NetworkFormat, NetworkPayload, NetworkSink,
    NetworkSinkConfig,
    SessionManifest, FEATURES_FILE, FRAMES_FILE, MANIFEST_FILE,
};
