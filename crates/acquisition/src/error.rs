//! Acquisition error types

use thiserror::Error;

use crate::AcquisitionState;

/// Faults at the hardware scan boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The converter failed to complete a scan.
    #[error("scan failed to complete: {0}")]
    ScanFault(String),

    /// The descriptor cannot be realized by this converter.
    #[error("descriptor not supported: {0}")]
    Unsupported(String),

    /// A continuous conversion is already registered.
    #[error("continuous conversion already running")]
    AlreadyRunning,
}

/// Errors surfaced synchronously to the console consumer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The requested operation is illegal in the current state; nothing
    /// was changed.
    #[error("busy: {0:?} acquisition in progress")]
    Busy(AcquisitionState),

    /// The scan driver refused or failed the request.
    #[error("scan driver: {0}")]
    Driver(#[from] DriverError),
}
