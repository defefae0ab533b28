//! SinkHandle - manages a sink with isolated queue and worker task

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use contracts::{GestureFrame, GestureSink};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

/// Which frames a sink receives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameFilter {
    /// Every engine cycle
    #[default]
    All,
    /// Only cycles that emitted a gesture
    EventsOnly,
}

impl FrameFilter {
    /// Read the `events_only` sink parameter (`true` / `false`, default false)
    pub fn from_params(
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        match params.get("events_only").map(String::as_str) {
            None | Some("false") => Ok(Self::All),
            Some("true") => Ok(Self::EventsOnly),
            Some(other) => Err(DispatcherError::invalid_param(
                name,
                "events_only",
                format!("expected true or false, got '{other}'"),
            )),
        }
    }

    #[inline]
    pub fn accepts(&self, frame: &GestureFrame) -> bool {
        match self {
            Self::All => true,
            Self::EventsOnly => frame.has_gesture(),
        }
    }
}

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    filter: FrameFilter,
    tx: mpsc::Sender<GestureFrame>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: GestureSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new(&name));

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            filter: FrameFilter::All,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn with_filter(mut self, filter: FrameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> FrameFilter {
        self.filter
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Send a frame to the sink (non-blocking)
    ///
    /// Returns true if queued, false if filtered out or dropped
    pub fn try_send(&self, frame: GestureFrame) -> bool {
        if !self.filter.accepts(&frame) {
            self.metrics.inc_skipped_count();
            return false;
        }

        match self.tx.try_send(frame) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(f)) => {
                self.metrics.inc_dropped_count();
                warn!(sink = %self.name, cycle = f.cycle, "Queue full, frame dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the sink worker gracefully
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

/// Worker task that consumes frames and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: GestureSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<GestureFrame>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(frame) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&frame).await {
            Ok(()) => {
                metrics.inc_write_count();
                if frame.has_gesture() {
                    metrics.inc_gesture_count();
                    trace!(sink = %name, cycle = frame.cycle, gesture = %frame.event.kind, "Gesture written");
                } else {
                    trace!(sink = %name, cycle = frame.cycle, "Frame written");
                }
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(sink = %name, cycle = frame.cycle, error = %e, "Write failed");
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use contracts::{
        CalibrationState, ContractError, DirectionalOutput, GestureEvent, GestureKind, Sample,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    pub(crate) fn make_frame(cycle: u64, kind: GestureKind) -> GestureFrame {
        GestureFrame {
            cycle,
            timestamp: Some(cycle as f64 * 0.01),
            event: GestureEvent::new(kind),
            directional: DirectionalOutput::neutral(),
            raw: Sample::at_rest(),
            calibration: CalibrationState::Uncalibrated,
            features: None,
        }
    }

    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl GestureSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _frame: &GestureFrame) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn make_sink(name: &str, should_fail: bool, delay_ms: u64) -> (MockSink, Arc<AtomicU64>) {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: name.to_string(),
            write_count: Arc::clone(&write_count),
            should_fail,
            delay_ms,
        };
        (sink, write_count)
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let (sink, write_count) = make_sink("test", false, 0);
        let handle = SinkHandle::spawn(sink, 10);

        for i in 0..5 {
            assert!(handle.try_send(make_frame(i, GestureKind::None)));
        }

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn test_sink_handle_queue_full() {
        let (sink, _) = make_sink("slow", false, 100);
        let handle = SinkHandle::spawn(sink, 2);

        for i in 0..10 {
            handle.try_send(make_frame(i, GestureKind::None));
        }

        assert!(handle.metrics().dropped_count() > 0);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let (sink, _) = make_sink("failing", true, 0);
        let handle = SinkHandle::spawn(sink, 10);

        for i in 0..3 {
            handle.try_send(make_frame(i, GestureKind::Tap));
        }
        sleep(Duration::from_millis(50)).await;

        assert_eq!(handle.metrics().failure_count(), 3);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_events_only_filter() {
        let (sink, write_count) = make_sink("events", false, 0);
        let handle = SinkHandle::spawn(sink, 10).with_filter(FrameFilter::EventsOnly);

        assert!(!handle.try_send(make_frame(1, GestureKind::None)));
        assert!(handle.try_send(make_frame(2, GestureKind::Hold)));
        assert!(!handle.try_send(make_frame(3, GestureKind::None)));
        assert_eq!(handle.metrics().skipped_count(), 2);

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.gesture_count(), 1);
    }

    #[test]
    fn test_filter_params() {
        let mut params = HashMap::new();
        assert_eq!(FrameFilter::from_params("s", &params).unwrap(), FrameFilter::All);
        params.insert("events_only".to_string(), "true".to_string());
        assert_eq!(
            FrameFilter::from_params("s", &params).unwrap(),
            FrameFilter::EventsOnly
        );
        params.insert("events_only".to_string(), "yes".to_string());
        assert!(FrameFilter::from_params("s", &params).is_err());
    }
}
