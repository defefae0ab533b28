//! FileSink - writes frames as JSON lines under a session directory
//!
//! Layout:
//! ```text
//! <base_path>/
//!   session.json     manifest (start, finish, counts)
//!   frames.jsonl     one GestureFrame per line
//!   features.jsonl   one LabeledFeatures per line, when recording
//! ```

use chrono::{DateTime, Utc};
use contracts::{ContractError, GestureFrame, GestureSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

pub const FRAMES_FILE: &str = "frames.jsonl";
pub const FEATURES_FILE: &str = "features.jsonl";
pub const MANIFEST_FILE: &str = "session.json";

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// Session manifest written next to the frame log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub sink: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub frames: u64,
    pub gestures: u64,
    pub feature_rows: u64,
}

/// Sink that appends frames to disk
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    frames: Option<BufWriter<File>>,
    features: Option<BufWriter<File>>,
    manifest: SessionManifest,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        fs::create_dir_all(&config.base_path)?;

        let frames = File::create(config.base_path.join(FRAMES_FILE))?;
        let manifest = SessionManifest {
            sink: name.clone(),
            started_at: Utc::now(),
            finished_at: None,
            frames: 0,
            gestures: 0,
            feature_rows: 0,
        };

        let sink = Self {
            name,
            config,
            frames: Some(BufWriter::new(frames)),
            features: None,
            manifest,
        };
        sink.write_manifest()?;
        Ok(sink)
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    pub fn manifest(&self) -> &SessionManifest {
        &self.manifest
    }

    fn write_manifest(&self) -> std::io::Result<()> {
        let file = File::create(self.config.base_path.join(MANIFEST_FILE))?;
        serde_json::to_writer_pretty(file, &self.manifest).map_err(std::io::Error::other)
    }

    fn append_frame(&mut self, frame: &GestureFrame) -> std::io::Result<()> {
        let writer = self
            .frames
            .as_mut()
            .ok_or_else(|| std::io::Error::other("sink closed"))?;
        serde_json::to_writer(&mut *writer, frame).map_err(std::io::Error::other)?;
        writer.write_all(b"\n")?;

        self.manifest.frames += 1;
        if frame.has_gesture() {
            self.manifest.gestures += 1;
        }

        if let Some(row) = &frame.features {
            if self.features.is_none() {
                let file = File::create(self.config.base_path.join(FEATURES_FILE))?;
                self.features = Some(BufWriter::new(file));
            }
            if let Some(writer) = self.features.as_mut() {
                serde_json::to_writer(&mut *writer, row).map_err(std::io::Error::other)?;
                writer.write_all(b"\n")?;
                self.manifest.feature_rows += 1;
            }
        }
        Ok(())
    }

    fn flush_writers(&mut self) -> std::io::Result<()> {
        if let Some(w) = self.frames.as_mut() {
            w.flush()?;
        }
        if let Some(w) = self.features.as_mut() {
            w.flush()?;
        }
        Ok(())
    }
}

impl GestureSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, frame),
        fields(sink = %self.name, cycle = frame.cycle)
    )]
    async fn write(&mut self, frame: &GestureFrame) -> Result<(), ContractError> {
        self.append_frame(frame).map_err(|e| {
            error!(sink = %self.name, cycle = frame.cycle, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_writers()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_writers()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        self.frames = None;
        self.features = None;

        self.manifest.finished_at = Some(Utc::now());
        self.write_manifest()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        debug!(
            sink = %self.name,
            frames = self.manifest.frames,
            gestures = self.manifest.gestures,
            "FileSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::tests::make_frame;
    use contracts::{FeatureVector, GestureKind, LabeledFeatures};
    use tempfile::tempdir;

    fn make_sink(dir: &Path) -> FileSink {
        let config = FileSinkConfig {
            base_path: dir.to_path_buf(),
        };
        FileSink::new("test_file", config).unwrap()
    }

    #[tokio::test]
    async fn test_file_sink_writes_jsonl() {
        let dir = tempdir().unwrap();
        let mut sink = make_sink(dir.path());

        sink.write(&make_frame(1, GestureKind::None)).await.unwrap();
        sink.write(&make_frame(2, GestureKind::Tap)).await.unwrap();
        sink.close().await.unwrap();

        let text = fs::read_to_string(dir.path().join(FRAMES_FILE)).unwrap();
        let frames: Vec<GestureFrame> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].event.kind, GestureKind::Tap);
        assert!(!dir.path().join(FEATURES_FILE).exists());

        let manifest: SessionManifest =
            serde_json::from_slice(&fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.frames, 2);
        assert_eq!(manifest.gestures, 1);
        assert!(manifest.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_file_sink_records_features() {
        let dir = tempdir().unwrap();
        let mut sink = make_sink(dir.path());

        let mut frame = make_frame(7, GestureKind::None);
        frame.features = Some(LabeledFeatures {
            label: "rest".to_string(),
            features: FeatureVector::zeros(),
        });
        sink.write(&frame).await.unwrap();
        sink.flush().await.unwrap();

        let text = fs::read_to_string(dir.path().join(FEATURES_FILE)).unwrap();
        let row: LabeledFeatures = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(row.label, "rest");
        assert_eq!(sink.manifest().feature_rows, 1);
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = make_sink(dir.path());
        sink.close().await.unwrap();

        assert!(sink.write(&make_frame(1, GestureKind::None)).await.is_err());
    }
}
