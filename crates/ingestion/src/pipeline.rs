//! Ingestion Pipeline main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{SamplePacket, SensorSource};
use tracing::{debug, info, instrument};

use crate::adapter::{ChannelEnds, SourceAdapter};
use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::store::SampleStore;

/// Ingestion Pipeline
///
/// Owns the registered sources and hands their samples to a single consumer
/// through a bounded channel. Every sample is also published to the shared
/// [`SampleStore`] for pull-style consumers.
pub struct IngestionPipeline {
    adapters: Vec<SourceAdapter>,
    metrics: Arc<IngestionMetrics>,
    store: Arc<SampleStore>,
    tx: Sender<SamplePacket>,
    /// Kept for drop-oldest eviction; also the consumer end until taken
    evict: Receiver<SamplePacket>,
    rx: Option<Receiver<SamplePacket>>,
    default_config: BackpressureConfig,
}

impl IngestionPipeline {
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            adapters: Vec::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            store: Arc::new(SampleStore::new()),
            tx,
            evict: rx.clone(),
            rx: Some(rx),
            default_config: config,
        }
    }

    /// Register a sample source
    ///
    /// # Errors
    /// `AlreadyRegistered` if a source with the same ID exists.
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source, config),
        fields(source_id = %source.source_id())
    )]
    pub fn register_source(
        &mut self,
        source: Box<dyn SensorSource>,
        config: Option<BackpressureConfig>,
    ) -> Result<()> {
        let source_id = source.source_id().to_string();
        if self.adapters.iter().any(|a| a.source_id() == source_id) {
            return Err(IngestionError::AlreadyRegistered { source_id });
        }

        let adapter =
            SourceAdapter::new(source, config.unwrap_or_else(|| self.default_config.clone()));
        debug!(source_id = %source_id, "registered sample source");
        self.adapters.push(adapter);
        Ok(())
    }

    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all sample sources");
        for adapter in &self.adapters {
            if !adapter.is_listening() {
                debug!(source_id = %adapter.source_id(), "starting adapter");
                adapter.start(
                    ChannelEnds {
                        tx: self.tx.clone(),
                        evict: self.evict.clone(),
                    },
                    self.metrics.clone(),
                    Some(self.store.clone()),
                );
            }
        }
    }

    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all sample sources");
        for adapter in &self.adapters {
            if adapter.is_listening() {
                debug!(source_id = %adapter.source_id(), "stopping adapter");
                adapter.stop();
            }
        }
        self.store.set_connected(false);
    }

    /// Data stream receiver
    ///
    /// Can only be taken once, subsequent calls return None.
    pub fn take_receiver(&mut self) -> Option<Receiver<SamplePacket>> {
        self.rx.take()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Shared latest-sample store
    pub fn store(&self) -> Arc<SampleStore> {
        self.store.clone()
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_source_listening(&self, source_id: &str) -> bool {
        self.adapters
            .iter()
            .find(|a| a.source_id() == source_id)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }

    /// True while at least one source is still delivering.
    ///
    /// Also refreshes the store's connectivity flag.
    pub fn is_connected(&self) -> bool {
        let connected = self.adapters.iter().any(|a| a.is_connected());
        self.store.set_connected(connected);
        connected
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
