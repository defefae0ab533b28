//! Sink implementations

mod file;
mod log;
mod network;

pub use self::file::{FileSink, FileSinkConfig, SessionManifest, FEATURES_FILE, FRAMES_FILE, MANIFEST_FILE};
pub use self::log::LogSink;
pub use self::network::{
    GestureDatagram, NetworkFormat, NetworkPayload, NetworkSink, NetworkSinkConfig,
};
