//! Acquisition state machine
//!
//! A single atomically accessed state word arbitrates which operations
//! are legal. Transitions into an acquiring state go through
//! compare-and-swap, so two near-simultaneous start requests cannot both
//! succeed.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AcquisitionError;

/// The sole arbiter of which acquisition operations are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AcquisitionState {
    /// No conversion in progress.
    Idle = 0,
    /// A synchronous scan is running; completes before control returns.
    SingleShot = 1,
    /// Background scans are being delivered via callback.
    Continuous = 2,
}

impl AcquisitionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => AcquisitionState::SingleShot,
            2 => AcquisitionState::Continuous,
            _ => AcquisitionState::Idle,
        }
    }
}

/// Gate for single-shot vs. continuous acquisition.
pub struct ModeController {
    state: AtomicU8,
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(AcquisitionState::Idle as u8),
        }
    }

    /// Current state.
    pub fn state(&self) -> AcquisitionState {
        AcquisitionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether background scans should still be accepted.
    pub fn is_continuous(&self) -> bool {
        self.state() == AcquisitionState::Continuous
    }

    /// Claim the converter for one synchronous scan.
    pub fn begin_single_shot(&self) -> Result<(), AcquisitionError> {
        self.transition(AcquisitionState::Idle, AcquisitionState::SingleShot)
    }

    /// Release the converter after a synchronous scan.
    pub fn finish_single_shot(&self) {
        self.state
            .store(AcquisitionState::Idle as u8, Ordering::Release);
    }

    /// Claim the converter for continuous acquisition.
    pub fn start_continuous(&self) -> Result<(), AcquisitionError> {
        self.transition(AcquisitionState::Idle, AcquisitionState::Continuous)
    }

    /// Return to idle unconditionally; idempotent, always succeeds.
    ///
    /// Returns the prior state so the caller knows whether hardware
    /// actually needs stopping.
    pub fn stop(&self) -> AcquisitionState {
        let prior = AcquisitionState::from_u8(
            self.state
                .swap(AcquisitionState::Idle as u8, Ordering::AcqRel),
        );
        debug!(?prior, "acquisition state stopped");
        prior
    }

    fn transition(
        &self,
        from: AcquisitionState,
        to: AcquisitionState,
    ) -> Result<(), AcquisitionError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|observed| AcquisitionError::Busy(AcquisitionState::from_u8(observed)))
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}
