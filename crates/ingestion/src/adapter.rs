//! Source adapter
//!
//! Bridges a push-style `SensorSource` into the ingestion channel and,
//! optionally, the shared `SampleStore`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{DropPolicy, SampleCallback, SamplePacket, SensorSource};
use tracing::{debug, trace, warn};

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::store::SampleStore;

/// Both ends of the ingestion channel as seen by a producer.
///
/// The receiver clone lets the producer evict the oldest queued sample.
#[derive(Clone)]
pub(crate) struct ChannelEnds {
    pub tx: Sender<SamplePacket>,
    pub evict: Receiver<SamplePacket>,
}

/// Send a packet, applying the backpressure policy when the channel is full
#[inline]
pub(crate) fn send_packet(
    channel: &ChannelEnds,
    packet: SamplePacket,
    metrics: &IngestionMetrics,
    source_id: &str,
    drop_policy: DropPolicy,
) {
    match channel.tx.try_send(packet) {
        Ok(()) => {
            trace!(source_id = %source_id, "sample queued");
        }
        Err(TrySendError::Full(packet)) => {
            metrics.record_dropped();
            metrics::counter!(
                "ingestion_samples_dropped_total",
                "source_id" => source_id.to_string()
            )
            .increment(1);
            match drop_policy {
                DropPolicy::DropNewest => {
                    trace!(source_id = %source_id, "sample dropped (newest)");
                }
                DropPolicy::DropOldest => {
                    let _ = channel.evict.try_recv();
                    if channel.tx.try_send(packet).is_err() {
                        trace!(source_id = %source_id, "sample dropped after eviction");
                    } else {
                        trace!(source_id = %source_id, "sample dropped (oldest)");
                    }
                }
            }
        }
        Err(TrySendError::Closed(_)) => {
            warn!(source_id = %source_id, "ingestion channel closed");
        }
    }
    metrics.update_queue_len(channel.tx.len());
}

/// Adapts one `SensorSource` to the ingestion pipeline
pub struct SourceAdapter {
    source_id: String,
    source: Box<dyn SensorSource>,
    config: BackpressureConfig,
    listening: Arc<AtomicBool>,
}

impl SourceAdapter {
    pub fn new(source: Box<dyn SensorSource>, config: BackpressureConfig) -> Self {
        Self {
            source_id: source.source_id().to_string(),
            source,
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub(crate) fn start(
        &self,
        channel: ChannelEnds,
        metrics: Arc<IngestionMetrics>,
        store: Option<Arc<SampleStore>>,
    ) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let source_id = self.source_id.clone();
        let drop_policy = self.config.drop_policy;
        let listening = self.listening.clone();

        debug!(source_id = %source_id, ?drop_policy, "starting source adapter");

        if let Some(store) = &store {
            store.set_connected(true);
        }

        let callback: SampleCallback = Arc::new(move |packet| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            metrics.record_received();
            if let Some(store) = &store {
                store.store_packet(&packet);
            }
            send_packet(&channel, packet, &metrics, &source_id, drop_policy);
        });

        self.source.listen(callback);
    }

    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(source_id = %self.source_id, "stopping source adapter");
            self.source.stop();
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    /// Source still delivering
    pub fn is_connected(&self) -> bool {
        self.is_listening() && self.source.is_connected()
    }
}
