//! Replay source
//!
//! Plays back a JSONL recording, one sample per line. Both frame logs written
//! by the file sink (`{"timestamp":..,"raw":{..}}`) and raw packet dumps
//! (`{"timestamp":..,"sample":{..}}`) are accepted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{Sample, SampleCallback, SamplePacket, SensorSource, SourceConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};

/// One line of a recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(alias = "sample")]
    pub raw: Sample,
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub source_id: String,
    pub path: PathBuf,
    /// Playback speed multiplier
    pub speed: f64,
    pub looping: bool,
    /// Spacing used for lines without a timestamp
    pub rate_hz: f64,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            source_id: "replay".to_string(),
            path: path.into(),
            speed: 1.0,
            looping: false,
            rate_hz: 100.0,
        }
    }

    /// Build from a profile source section
    ///
    /// # Errors
    /// `InvalidSource` when no replay path is configured.
    pub fn from_source_config(source: &SourceConfig) -> Result<Self> {
        let path = source
            .replay_path
            .clone()
            .ok_or_else(|| IngestionError::invalid_source(&source.id, "replay_path is required"))?;
        Ok(Self {
            source_id: source.id.clone(),
            path,
            speed: source.replay_speed,
            looping: source.replay_loop,
            rate_hz: source.rate_hz,
        })
    }
}

/// Read and decode a whole recording
///
/// Blank lines are skipped. The first undecodable line fails the load.
#[instrument(name = "replay_load_recording", skip_all, fields(path = %path.display()))]
pub fn load_recording(path: &Path, source_id: &str) -> Result<Vec<RecordedSample>> {
    let file = File::open(path).map_err(|source| IngestionError::Recording {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| IngestionError::Recording {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RecordedSample =
            serde_json::from_str(line).map_err(|e| IngestionError::ParseFailed {
                source_id: source_id.to_string(),
                line: idx + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(IngestionError::EmptyRecording {
            path: path.to_path_buf(),
        });
    }
    debug!(count = records.len(), "recording loaded");
    Ok(records)
}

/// Packets a recording produces, with timestamps filled in and made monotonic
/// across loops
fn timeline(
    records: &[RecordedSample],
    rate_hz: f64,
    offset: f64,
    first_seq: u64,
    source_id: &str,
) -> Vec<SamplePacket> {
    let step = 1.0 / rate_hz.max(1.0);
    let base = records.first().and_then(|r| r.timestamp).unwrap_or(0.0);
    let mut last = offset - step;

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let timestamp = match record.timestamp {
                Some(t) => (offset + t - base).max(last),
                None => last + step,
            };
            last = timestamp;
            SamplePacket {
                source_id: source_id.to_string(),
                timestamp,
                sequence: first_seq + i as u64,
                sample: record.raw,
            }
        })
        .collect()
}

/// Replay source
pub struct ReplaySource {
    config: ReplayConfig,
    records: Arc<Vec<RecordedSample>>,
    listening: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
}

impl ReplaySource {
    /// Load the recording eagerly so bad files fail at startup
    pub fn open(config: ReplayConfig) -> Result<Self> {
        let records = load_recording(&config.path, &config.source_id)?;
        info!(
            source_id = %config.source_id,
            path = %config.path.display(),
            samples = records.len(),
            speed = config.speed,
            looping = config.looping,
            "replay source ready"
        );
        Ok(Self {
            config,
            records: Arc::new(records),
            listening: Arc::new(AtomicBool::new(false)),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RecordedSample] {
        &self.records
    }
}

impl SensorSource for ReplaySource {
    fn source_id(&self) -> &str {
        &self.config.source_id
    }

    fn listen(&self, callback: SampleCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let records = self.records.clone();
        let listening = self.listening.clone();
        let connected = self.connected.clone();
        connected.store(true, Ordering::SeqCst);

        thread::spawn(move || {
            let speed = if config.speed > 0.0 { config.speed } else { 1.0 };
            let mut offset = 0.0;
            let mut sequence = 0u64;

            'outer: loop {
                let packets =
                    timeline(&records, config.rate_hz, offset, sequence, &config.source_id);
                let mut previous: Option<f64> = None;
                for packet in packets {
                    if !listening.load(Ordering::Relaxed) {
                        break 'outer;
                    }
                    if let Some(prev) = previous {
                        let wait = (packet.timestamp - prev) / speed;
                        if wait > 0.0 {
                            thread::sleep(Duration::from_secs_f64(wait));
                        }
                    }
                    previous = Some(packet.timestamp);
                    offset = packet.timestamp + 1.0 / config.rate_hz.max(1.0);
                    sequence = packet.sequence + 1;
                    callback(packet);
                }
                if !config.looping {
                    break;
                }
                debug!(source_id = %config.source_id, "replay looping");
            }

            connected.store(false, Ordering::SeqCst);
            debug!(source_id = %config.source_id, sent = sequence, "replay finished");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
