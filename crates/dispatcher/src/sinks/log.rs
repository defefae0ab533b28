//! LogSink - reports frames through tracing

use contracts::{ContractError, GestureFrame, GestureSink};
use tracing::{info, instrument, trace};

/// Sink that logs recognised gestures at info and idle cycles at trace
pub struct LogSink {
    name: String,
    gestures: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gestures: 0,
        }
    }

    pub fn gestures_logged(&self) -> u64 {
        self.gestures
    }

    fn log_frame(&mut self, frame: &GestureFrame) {
        if frame.has_gesture() {
            self.gestures += 1;
            info!(
                sink = %self.name,
                cycle = frame.cycle,
                gesture = %frame.event.kind,
                intensity = frame.event.intensity,
                confidence = frame.event.confidence,
                magnitude = frame.directional.calibrated_magnitude,
                "Gesture detected"
            );
        } else {
            trace!(
                sink = %self.name,
                cycle = frame.cycle,
                moving = frame.directional.is_moving,
                calibration = frame.calibration.as_str(),
                "Idle cycle"
            );
        }
    }
}

impl GestureSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, frame),
        fields(sink = %self.name, cycle = frame.cycle)
    )]
    async fn write(&mut self, frame: &GestureFrame) -> Result<(), ContractError> {
        self.log_frame(frame);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, gestures = self.gestures, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::tests::make_frame;
    use contracts::GestureKind;

    #[tokio::test]
    async fn test_log_sink_counts_gestures() {
        let mut sink = LogSink::new("test_log");
        sink.write(&make_frame(1, GestureKind::None)).await.unwrap();
        sink.write(&make_frame(2, GestureKind::SpinLeft)).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.gestures_logged(), 1);
        assert_eq!(sink.name(), "test_log");
    }
}
