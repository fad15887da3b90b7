//! Hardware scan boundary
//!
//! The converter hardware is a consumed capability behind these traits.
//! Completion callbacks run in producer context: they must never block
//! and must finish in bounded time.

use std::sync::Arc;

use sample_aggregator::ScanDescriptor;

use crate::DriverError;

/// Receiver for conversion-complete events, invoked from producer
/// context on every completed or failed scan.
pub trait ScanSink: Send + Sync {
    /// One burst of raw codes finished converting.
    fn on_scan_complete(&self, burst: &[u16]);

    /// The scan failed in hardware.
    fn on_scan_error(&self);
}

/// A scan-capable converter.
pub trait ScanDriver: Send + Sync {
    /// Run one burst synchronously, blocking the caller until the raw
    /// samples are available.
    fn single_shot(&self, descriptor: &ScanDescriptor) -> Result<Vec<u16>, DriverError>;

    /// Begin delivering bursts to `sink` until stopped.
    fn start_continuous(
        &self,
        descriptor: &ScanDescriptor,
        sink: Arc<dyn ScanSink>,
    ) -> Result<(), DriverError>;

    /// Disable future completion callbacks. Completions already in
    /// flight may still be delivered after this returns.
    fn stop_continuous(&self);
}
