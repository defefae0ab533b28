//! Sink metrics for observability
//!
//! Kept as atomics for in-process snapshots and mirrored to the `metrics`
//! facade with a `sink` label.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    name: String,
    queue_len: AtomicUsize,
    write_count: AtomicU64,
    failure_count: AtomicU64,
    /// Frames dropped because the sink queue was full
    dropped_count: AtomicU64,
    /// Frames the sink chose not to write (e.g. events-only filtering)
    skipped_count: AtomicU64,
    /// Written frames that carried a gesture
    gesture_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        metrics::gauge!("dispatcher_queue_len", "sink" => self.name.clone()).set(len as f64);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.emit("ok");
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.emit("failed");
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
        self.emit("dropped");
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    pub fn inc_skipped_count(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn gesture_count(&self) -> u64 {
        self.gesture_count.load(Ordering::Relaxed)
    }

    pub fn inc_gesture_count(&self) {
        self.gesture_count.fetch_add(1, Ordering::Relaxed);
    }

    fn emit(&self, status: &'static str) {
        metrics::counter!(
            "dispatcher_frames_total",
            "sink" => self.name.clone(),
            "status" => status
        )
        .increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            skipped_count: self.skipped_count(),
            gesture_count: self.gesture_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub skipped_count: u64,
    pub gesture_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_snapshot() {
        let metrics = SinkMetrics::new("file");
        metrics.inc_write_count();
        metrics.inc_write_count();
        metrics.inc_failure_count();
        metrics.inc_dropped_count();
        metrics.inc_gesture_count();
        metrics.set_queue_len(3);

        let snap = metrics.snapshot();
        assert_eq!(snap.write_count, 2);
        assert_eq!(snap.failure_count, 1);
        assert_eq!(snap.dropped_count, 1);
        assert_eq!(snap.skipped_count, 0);
        assert_eq!(snap.gesture_count, 1);
        assert_eq!(snap.queue_len, 3);
    }
}
