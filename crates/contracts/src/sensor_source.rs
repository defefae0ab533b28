//! SensorSource trait - IMU sample source abstraction
//!
//! Decouples ingestion from where samples come from: a synthetic stream, a
//! recording, or a device driver thread. Sources push; the ingestion layer
//! decides what to do with each sample.

use std::sync::Arc;

use crate::SamplePacket;

/// Sample callback type
///
/// Invoked on the source's own thread for every sample it produces.
pub type SampleCallback = Arc<dyn Fn(SamplePacket) + Send + Sync>;

/// Sample source trait
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn SensorSource> = build_source(&profile.source)?;
/// source.listen(Arc::new(|packet| {
///     println!("sample #{}: {:?}", packet.sequence, packet.sample.accel);
/// }));
/// // ... use source ...
/// source.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Source ID
    fn source_id(&self) -> &str;

    /// Register the sample callback and start producing.
    ///
    /// Calling it again while already listening is a no-op.
    fn listen(&self, callback: SampleCallback);

    /// Stop producing samples
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;

    /// Whether the underlying device or stream is still delivering.
    ///
    /// Defaults to `is_listening`; sources that can finish on their own
    /// (replay without loop) report false once exhausted.
    fn is_connected(&self) -> bool {
        self.is_listening()
    }
}
