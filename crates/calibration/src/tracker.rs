//! Smoothed reference-voltage estimate

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

use crate::VREFINT_NOMINAL_CODE;

/// Exponentially smoothed estimate of the reference-channel code.
///
/// The raw reference reading is noisy per scan; a light low-pass with
/// decay 1/4 stabilizes the conversion denominator without storing
/// history. Written by the producer once per completed scan, read by the
/// consumer during unit conversion; the estimate is published as a single
/// atomic word so either side always observes a whole value.
pub struct CalibrationTracker {
    estimate: AtomicU32,
}

impl CalibrationTracker {
    /// Start from the given estimate.
    pub fn new(initial: u32) -> Self {
        Self {
            estimate: AtomicU32::new(initial),
        }
    }

    /// Start from the nominal reference code.
    pub fn with_nominal() -> Self {
        Self::new(VREFINT_NOMINAL_CODE)
    }

    /// Fold one measured reference average into the estimate
    /// (producer only). Always succeeds; returns the new estimate.
    pub fn update(&self, measured: u32) -> u32 {
        let old = u64::from(self.estimate.load(Ordering::Relaxed));
        let next = ((3 * old + u64::from(measured)) / 4) as u32;
        self.estimate.store(next, Ordering::Release);
        next
    }

    /// Current estimate, readable from any context.
    pub fn estimate(&self) -> u32 {
        self.estimate.load(Ordering::Acquire)
    }

    /// Replace the estimate wholesale; returns the previous value.
    pub fn overwrite(&self, value: u32) -> u32 {
        let previous = self.estimate.swap(value, Ordering::AcqRel);
        info!(previous, value, "reference estimate overwritten");
        previous
    }
}

impl Default for CalibrationTracker {
    fn default() -> Self {
        Self::with_nominal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_deterministic() {
        let tracker = CalibrationTracker::new(1000);
        assert_eq!(tracker.update(2000), 1250);
        assert_eq!(tracker.estimate(), 1250);
    }

    #[test]
    fn matching_measurement_is_a_fixed_point() {
        let tracker = CalibrationTracker::new(1000);
        for _ in 0..16 {
            assert_eq!(tracker.update(1000), 1000);
        }
        assert_eq!(tracker.estimate(), 1000);
    }

    #[test]
    fn converges_toward_a_steady_measurement() {
        let tracker = CalibrationTracker::new(0);
        for _ in 0..64 {
            tracker.update(1501);
        }
        // 3/4-decay never quite reaches the target from below.
        assert!(tracker.estimate() >= 1498);
        assert!(tracker.estimate() <= 1501);
    }

    #[test]
    fn overwrite_returns_previous() {
        let tracker = CalibrationTracker::with_nominal();
        let previous = tracker.overwrite(1600);
        assert_eq!(previous, VREFINT_NOMINAL_CODE);
        assert_eq!(tracker.estimate(), 1600);
    }
}
