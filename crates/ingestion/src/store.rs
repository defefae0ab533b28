//! Latest-value sample store shared between a source thread and the
//! detection loop.
//!
//! Each axis is kept as the bit pattern of an `f64` in an `AtomicU64`,
//! guarded by a sequence counter (seqlock). Readers never block the writer;
//! a reader that overlaps a write retries.

use std::hint;
use std::sync::atomic::{fence, AtomicBool, AtomicU64, Ordering};

use contracts::{Sample, SamplePacket, Vector3};

const AXES: usize = 9;

/// Consistent copy of the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSnapshot {
    pub sample: Sample,
    pub timestamp: f64,
    /// Number of completed writes; unchanged means no new sample
    pub version: u64,
}

#[derive(Debug)]
pub struct SampleStore {
    /// Odd while a write is in progress
    seq: AtomicU64,
    axes: [AtomicU64; AXES],
    timestamp: AtomicU64,
    connected: AtomicBool,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            axes: std::array::from_fn(|_| AtomicU64::new(0)),
            timestamp: AtomicU64::new(0),
            connected: AtomicBool::new(false),
        }
    }

    /// Publish a sample
    pub fn store(&self, sample: &Sample, timestamp: f64) {
        let mut current = self.seq.load(Ordering::Relaxed);
        loop {
            if current & 1 == 1 {
                hint::spin_loop();
                current = self.seq.load(Ordering::Relaxed);
                continue;
            }
            match self.seq.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        fence(Ordering::Release);

        for (slot, value) in self.axes.iter().zip(flatten(sample)) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
        self.timestamp.store(timestamp.to_bits(), Ordering::Relaxed);

        self.seq.store(current + 2, Ordering::Release);
    }

    pub fn store_packet(&self, packet: &SamplePacket) {
        self.store(&packet.sample, packet.timestamp);
    }

    /// Consistent snapshot, `None` before the first write
    pub fn snapshot(&self) -> Option<StoreSnapshot> {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                hint::spin_loop();
                continue;
            }
            if before == 0 {
                return None;
            }

            let mut values = [0.0; AXES];
            for (value, slot) in values.iter_mut().zip(&self.axes) {
                *value = f64::from_bits(slot.load(Ordering::Relaxed));
            }
            let timestamp = f64::from_bits(self.timestamp.load(Ordering::Relaxed));

            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return Some(StoreSnapshot {
                    sample: unflatten(&values),
                    timestamp,
                    version: before / 2,
                });
            }
        }
    }

    /// Latest sample, `None` before the first write
    pub fn load(&self) -> Option<Sample> {
        self.snapshot().map(|s| s.sample)
    }

    /// Completed writes so far
    pub fn version(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

fn flatten(sample: &Sample) -> [f64; AXES] {
    let Sample { accel, gyro, mag } = sample;
    [
        accel.x, accel.y, accel.z, gyro.x, gyro.y, gyro.z, mag.x, mag.y, mag.z,
    ]
}

fn unflatten(v: &[f64; AXES]) -> Sample {
    Sample::new(
        Vector3::new(v[0], v[1], v[2]),
        Vector3::new(v[3], v[4], v[5]),
        Vector3::new(v[6], v[7], v[8]),
    )
}
