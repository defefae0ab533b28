//! Backpressure configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub use contracts::DropPolicy;
use contracts::SourceConfig;

/// Backpressure configuration
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Channel capacity
    pub channel_capacity: usize,

    /// Drop policy when full
    pub drop_policy: DropPolicy,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            drop_policy: DropPolicy::DropOldest,
        }
    }
}

impl BackpressureConfig {
    pub fn new(channel_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
            drop_policy,
        }
    }
}

impl From<&SourceConfig> for BackpressureConfig {
    fn from(source: &SourceConfig) -> Self {
        Self::new(source.channel_capacity, source.drop_policy)
    }
}

/// Ingestion metrics, shared between source threads and the consumer
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    pub samples_received: AtomicU64,

    /// Samples lost to backpressure, whichever end was dropped
    pub samples_dropped: AtomicU64,

    /// Channel depth after the last send
    pub queue_len: AtomicUsize,

    /// Unparseable recording lines
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_received: u64,
    pub samples_dropped: u64,
    pub queue_len: usize,
    pub parse_errors: u64,
}

impl MetricsSnapshot {
    /// Fraction of received samples lost to backpressure
    pub fn drop_rate(&self) -> f64 {
        if self.samples_received == 0 {
            0.0
        } else {
            self.samples_dropped as f64 / self.samples_received as f64
        }
    }
}
