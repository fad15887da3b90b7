//! Per-role burst folding

use scan_buffer::ReadingRecord;

use crate::{ChannelRole, ScanDescriptor};

/// Result of folding one burst.
#[derive(Debug, Clone, Default)]
pub struct Fold {
    /// Per-role averages of the burst.
    pub record: ReadingRecord,
    /// Accumulated signal-role sum, for oversampled readouts.
    pub signal_sum: u64,
    /// Number of signal-role samples that were accumulated.
    pub signal_count: u64,
    /// The burst length did not match the descriptor; the samples that
    /// were present are still folded, but the mismatch counts as a loss.
    pub truncated: bool,
}

/// Folds raw hardware bursts into per-role averaged readings.
///
/// Samples arrive interleaved in scan order: sample `i` belongs to
/// channel `i % channel_count`. Every sample feeds exactly one role
/// class, so no value is counted twice.
pub struct SampleAggregator;

impl SampleAggregator {
    /// Fold one burst into a reading.
    ///
    /// Each role class is averaged independently (sum over its samples
    /// divided by its sample count); a class with no samples averages to
    /// zero. Runs in bounded time and performs no I/O.
    pub fn fold(descriptor: &ScanDescriptor, burst: &[u16]) -> Fold {
        let channels = descriptor.channel_count();
        let truncated = burst.len() != descriptor.burst_len();

        // Index by role discriminant: unused, signal, reference, temperature.
        let mut sums = [0u64; 4];
        let mut counts = [0u64; 4];
        for (i, &code) in burst.iter().enumerate() {
            let class = match descriptor.role_of(i % channels) {
                ChannelRole::Unused => 0,
                ChannelRole::Signal => 1,
                ChannelRole::Reference => 2,
                ChannelRole::Temperature => 3,
            };
            sums[class] += u64::from(code);
            counts[class] += 1;
        }

        let average = |class: usize| -> u32 {
            if counts[class] == 0 {
                0
            } else {
                (sums[class] / counts[class]) as u32
            }
        };

        Fold {
            record: ReadingRecord {
                signal: average(1),
                reference: average(2),
                temperature: average(3),
                is_error: false,
            },
            signal_sum: sums[1],
            signal_count: counts[1],
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScanMode;

    fn descriptor(channels: Vec<ChannelRole>, depth: usize) -> ScanDescriptor {
        ScanDescriptor::new(channels, depth, ScanMode::Continuous).unwrap()
    }

    #[test]
    fn averages_each_role_independently() {
        let descriptor = descriptor(
            vec![
                ChannelRole::Signal,
                ChannelRole::Reference,
                ChannelRole::Temperature,
            ],
            2,
        );
        // Two scans of (signal, reference, temperature).
        let burst = [100u16, 1500, 900, 300, 1502, 902];

        let fold = SampleAggregator::fold(&descriptor, &burst);
        assert!(!fold.truncated);
        assert_eq!(fold.record.signal, 200);
        assert_eq!(fold.record.reference, 1501);
        assert_eq!(fold.record.temperature, 901);
        assert!(!fold.record.is_error);
        assert_eq!(fold.signal_sum, 400);
        assert_eq!(fold.signal_count, 2);
    }

    #[test]
    fn unused_channels_do_not_leak_into_signal() {
        let descriptor = descriptor(vec![ChannelRole::Signal, ChannelRole::Unused], 2);
        let burst = [10u16, 9999, 20, 9999];

        let fold = SampleAggregator::fold(&descriptor, &burst);
        assert_eq!(fold.record.signal, 15);
        assert_eq!(fold.signal_count, 2);
    }

    #[test]
    fn absent_role_averages_to_zero() {
        let descriptor = descriptor(vec![ChannelRole::Signal], 4);
        let burst = [7u16, 7, 7, 7];

        let fold = SampleAggregator::fold(&descriptor, &burst);
        assert_eq!(fold.record.reference, 0);
        assert_eq!(fold.record.temperature, 0);
    }

    #[test]
    fn short_burst_is_folded_and_flagged() {
        let descriptor = descriptor(vec![ChannelRole::Signal, ChannelRole::Reference], 4);
        // Only three of the expected eight samples arrived.
        let burst = [100u16, 1500, 200];

        let fold = SampleAggregator::fold(&descriptor, &burst);
        assert!(fold.truncated);
        assert_eq!(fold.record.signal, 150);
        assert_eq!(fold.record.reference, 1500);
    }

    #[test]
    fn empty_burst_is_flagged_and_zeroed() {
        let descriptor = descriptor(vec![ChannelRole::Signal], 8);
        let fold = SampleAggregator::fold(&descriptor, &[]);
        assert!(fold.truncated);
        assert_eq!(fold.record, ReadingRecord::default());
    }

    #[test]
    fn deep_burst_does_not_overflow_the_sum() {
        // Full-scale codes at a depth that would overflow 32-bit math.
        let descriptor = descriptor(vec![ChannelRole::Signal], 2048);
        let burst = vec![4095u16; 2048];

        let fold = SampleAggregator::fold(&descriptor, &burst);
        assert_eq!(fold.record.signal, 4095);
        assert_eq!(fold.signal_sum, 4095 * 2048);
    }
}
