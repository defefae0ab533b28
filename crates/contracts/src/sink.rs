//! GestureSink trait - Dispatcher output interface

use crate::{ContractError, GestureFrame};

/// Frame output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(GestureSink: Send)]
pub trait LocalGestureSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one engine frame
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, frame: &GestureFrame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
