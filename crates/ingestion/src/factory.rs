//! Build a sample source from a profile `[source]` section

use contracts::{SensorSource, SourceConfig, SourceKind};
use tracing::instrument;

use crate::error::Result;
use crate::mock::MockImuSource;
use crate::replay::{ReplayConfig, ReplaySource};

/// Instantiate the configured source
///
/// # Errors
/// Replay sources fail when the recording is missing, empty or malformed.
#[instrument(name = "ingestion_build_source", skip_all, fields(source_id = %config.id, kind = ?config.kind))]
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn SensorSource>> {
    match config.kind {
        SourceKind::Mock => Ok(Box::new(MockImuSource::from_source_config(config))),
        SourceKind::Replay => {
            let replay = ReplayConfig::from_source_config(config)?;
            Ok(Box::new(ReplaySource::open(replay)?))
        }
    }
}
