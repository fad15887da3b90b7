//! Conversion-complete producer
//!
//! Runs in the interrupt-class context of the scan driver. Every path
//! here is bounded and non-blocking: fold, update the estimate, push.

use std::sync::Arc;

use tracing::{debug, warn};

use calibration::CalibrationTracker;
use sample_aggregator::{ChannelRole, SampleAggregator, ScanDescriptor};
use scan_buffer::{ReadingRecord, RingBuffer};

use crate::{ModeController, ScanSink};

/// Folds completed scans into readings and hands them to the consumer.
pub struct ScanProducer {
    descriptor: ScanDescriptor,
    buffer: Arc<RingBuffer>,
    calibration: Arc<CalibrationTracker>,
    mode: Arc<ModeController>,
}

impl ScanProducer {
    pub fn new(
        descriptor: ScanDescriptor,
        buffer: Arc<RingBuffer>,
        calibration: Arc<CalibrationTracker>,
        mode: Arc<ModeController>,
    ) -> Self {
        Self {
            descriptor,
            buffer,
            calibration,
            mode,
        }
    }

    /// The continuous conversion group this producer folds.
    pub fn descriptor(&self) -> &ScanDescriptor {
        &self.descriptor
    }
}

impl ScanSink for ScanProducer {
    fn on_scan_complete(&self, burst: &[u16]) {
        if !self.mode.is_continuous() {
            // In-flight completion after stop; not an error.
            debug!("dropping scan completion delivered after stop");
            return;
        }

        let fold = SampleAggregator::fold(&self.descriptor, burst);
        if fold.truncated {
            warn!(
                expected = self.descriptor.burst_len(),
                got = burst.len(),
                "truncated scan burst"
            );
            self.buffer.increment_overflow();
        }
        if self.descriptor.has_role(ChannelRole::Reference) {
            self.calibration.update(fold.record.reference);
        }
        self.buffer.push(fold.record);
    }

    fn on_scan_error(&self) {
        if !self.mode.is_continuous() {
            debug!("dropping scan error delivered after stop");
            return;
        }

        warn!("hardware scan error, recording sentinel");
        self.buffer.push(ReadingRecord::sentinel());
        self.buffer.increment_overflow();
    }
}
