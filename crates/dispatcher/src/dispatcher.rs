//! Dispatcher - fans engine frames out to sinks

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{GestureFrame, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::{FrameFilter, SinkHandle};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Dispatcher configuration
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<GestureFrame>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<GestureFrame>) -> Self {
        Self { config, input_rx }
    }

    /// Create every configured sink and return a ready dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config).await?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
            frames_seen: 0,
            gestures_seen: 0,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    async fn initialize_handles(
        config: &DispatcherConfig,
    ) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut seen = HashSet::new();
        let mut handles = Vec::with_capacity(config.sinks.len());
        for sink_config in &config.sinks {
            if !seen.insert(sink_config.name.as_str()) {
                return Err(DispatcherError::DuplicateSink(sink_config.name.clone()));
            }
            handles.push(create_sink_handle(sink_config).await?);
        }
        Ok(handles)
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let filter = FrameFilter::from_params(&config.name, &config.params)?;

    let handle = match config.sink_type {
        SinkType::Log => SinkHandle::spawn(LogSink::new(&config.name), config.queue_capacity),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            SinkHandle::spawn(sink, config.queue_capacity)
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            SinkHandle::spawn(sink, config.queue_capacity)
        }
    };

    Ok(handle.with_filter(filter))
}

/// Fans engine frames out to every sink without blocking the detection loop
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<GestureFrame>,
    frames_seen: u64,
    gestures_seen: u64,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<GestureFrame>) -> Self {
        Self {
            handles,
            input_rx,
            frames_seen: 0,
            gestures_seen: 0,
        }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Returns the per-sink metrics once the input channel closes and every
    /// sink has flushed.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "Dispatcher started");

        while let Some(frame) = self.input_rx.recv().await {
            self.frames_seen += 1;
            if frame.has_gesture() {
                self.gestures_seen += 1;
            }
            self.dispatch_frame(&frame);

            if self.frames_seen.is_multiple_of(500) {
                debug!(
                    frames = self.frames_seen,
                    gestures = self.gestures_seen,
                    "Dispatcher progress"
                );
            }
        }

        info!(
            frames = self.frames_seen,
            gestures = self.gestures_seen,
            "Dispatcher input closed, shutting down"
        );

        // Workers may still hold queued frames; snapshot only after they drain
        let sink_metrics: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();
        Self::shutdown_handles(self.handles).await;
        let report = sink_metrics
            .into_iter()
            .map(|(name, metrics)| (name, metrics.snapshot()))
            .collect();

        info!("Dispatcher shutdown complete");
        report
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }

    fn dispatch_frame(&self, frame: &GestureFrame) {
        for handle in &self.handles {
            handle.try_send(frame.clone());
        }
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<GestureFrame>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::tests::make_frame;
    use contracts::GestureKind;
    use std::collections::HashMap;

    fn log_config(name: &str) -> SinkConfig {
        SinkConfig {
            name: name.to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10).with_filter(FrameFilter::EventsOnly),
        ];

        let dispatcher = Dispatcher::with_handles(handles, input_rx);
        let handle = dispatcher.spawn();

        for i in 0..5 {
            let kind = if i == 2 {
                GestureKind::Tap
            } else {
                GestureKind::None
            };
            input_tx.send(make_frame(i, kind)).await.unwrap();
        }
        drop(input_tx);

        let report = handle.await.unwrap();
        let all = &report[0].1;
        let events = &report[1].1;
        assert_eq!(all.skipped_count, 0);
        assert_eq!(events.skipped_count, 4);
    }

    /// Sleeps on every write so frames are still queued when input closes
    struct SlowSink {
        name: String,
    }

    impl contracts::GestureSink for SlowSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _frame: &GestureFrame) -> Result<(), contracts::ContractError> {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), contracts::ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), contracts::ContractError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_report_counts_writes_drained_at_shutdown() {
        let (input_tx, input_rx) = mpsc::channel(64);
        let sink = SlowSink {
            name: "slow".to_string(),
        };
        let dispatcher = Dispatcher::with_handles(vec![SinkHandle::spawn(sink, 64)], input_rx);
        let handle = dispatcher.spawn();

        for i in 0..40 {
            input_tx.send(make_frame(i, GestureKind::None)).await.unwrap();
        }
        drop(input_tx);

        let report = handle.await.unwrap();
        let (name, snapshot) = &report[0];
        assert_eq!(name, "slow");
        assert_eq!(snapshot.dropped_count, 0);
        assert_eq!(snapshot.write_count, 40);
        assert_eq!(snapshot.queue_len, 0);
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let dispatcher = create_dispatcher(vec![log_config("test_log")], input_rx)
            .await
            .unwrap();
        assert_eq!(dispatcher.sink_count(), 1);
        let handle = dispatcher.spawn();

        input_tx
            .send(make_frame(1, GestureKind::Hold))
            .await
            .unwrap();
        drop(input_tx);

        let report = handle.await.unwrap();
        assert_eq!(report[0].0, "test_log");
    }

    #[tokio::test]
    async fn test_duplicate_sink_names_rejected() {
        let (_tx, input_rx) = mpsc::channel(1);
        let result = create_dispatcher(vec![log_config("a"), log_config("a")], input_rx).await;
        assert!(matches!(result, Err(DispatcherError::DuplicateSink(name)) if name == "a"));
    }

    #[tokio::test]
    async fn test_invalid_events_only_param() {
        let (_tx, input_rx) = mpsc::channel(1);
        let mut config = log_config("bad");
        config
            .params
            .insert("events_only".to_string(), "maybe".to_string());
        let result = create_dispatcher(vec![config], input_rx).await;
        assert!(matches!(result, Err(DispatcherError::InvalidParam { .. })));
    }
}
