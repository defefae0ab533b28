//! Sample feed for the detection loop
//!
//! Push mode consumes every queued packet. Poll mode ignores the queue and
//! samples the shared store at the source rate, skipping ticks where no new
//! sample arrived.

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use contracts::SamplePacket;
use ingestion::SampleStore;
use tokio::time::{interval, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngestMode {
    #[default]
    Push,
    Poll,
}

pub struct SampleFeed {
    mode: IngestMode,
    source_id: String,
    rx: Receiver<SamplePacket>,
    store: Arc<SampleStore>,
    poll: Interval,
    last_version: u64,
}

impl SampleFeed {
    pub fn new(
        mode: IngestMode,
        source_id: impl Into<String>,
        rx: Receiver<SamplePacket>,
        store: Arc<SampleStore>,
        rate_hz: f64,
    ) -> Self {
        let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
        let mut poll = interval(period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            mode,
            source_id: source_id.into(),
            rx,
            store,
            poll,
            last_version: 0,
        }
    }

    /// Next sample to process; cancel-safe
    pub async fn next(&mut self) -> Option<SamplePacket> {
        match self.mode {
            IngestMode::Push => self.rx.recv().await.ok(),
            IngestMode::Poll => loop {
                self.poll.tick().await;
                // queued packets are superseded by the store
                while self.rx.try_recv().is_ok() {}

                if let Some(snapshot) = self.store.snapshot() {
                    if snapshot.version != self.last_version {
                        self.last_version = snapshot.version;
                        return Some(SamplePacket {
                            source_id: self.source_id.clone(),
                            timestamp: snapshot.timestamp,
                            sequence: snapshot.version,
                            sample: snapshot.sample,
                        });
                    }
                }
            },
        }
    }

    /// Nothing left that the loop has not seen yet
    pub fn is_drained(&self) -> bool {
        match self.mode {
            IngestMode::Push => self.rx.is_empty(),
            IngestMode::Poll => self.store.version() == self.last_version,
        }
    }
}
