//! Ring buffer implementation
//!
//! Single producer, single consumer. The write side runs in the
//! conversion-complete context and must never block or allocate; the read
//! side runs in the foreground command context. Head and tail are
//! monotonic sequence counters, so `head == tail` means empty and
//! `head - tail` is an exact element count; full and empty are never
//! conflated.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ReadingRecord;

/// Default buffer capacity (readings, one per completed scan)
pub const DEFAULT_CAPACITY: usize = 1024;

/// Records and overflow count taken as one consistent readout.
#[derive(Debug, Clone, Default)]
pub struct Drained {
    /// Pending readings in arrival order.
    pub records: Vec<ReadingRecord>,
    /// Readings lost (overwritten or failed in hardware) since the last
    /// readout.
    pub overflow: u64,
}

/// Lossy SPSC ring buffer for scan readings.
pub struct RingBuffer {
    /// Pre-allocated storage, indexed by sequence number mod capacity
    slots: Box<[UnsafeCell<ReadingRecord>]>,
    capacity: u64,
    /// Next sequence number to write; advanced only by the producer
    head: AtomicU64,
    /// Next sequence number to read; advanced only by the consumer
    tail: AtomicU64,
    /// Readings lost to overwrite plus hardware scan errors
    overflow: AtomicU64,
}

impl RingBuffer {
    /// Create a new ring buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be nonzero");
        let slots: Vec<UnsafeCell<ReadingRecord>> = (0..capacity)
            .map(|_| UnsafeCell::new(ReadingRecord::default()))
            .collect();
        Self {
            slots: slots.into_boxed_slice(),
            capacity: capacity as u64,
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            overflow: AtomicU64::new(0),
        }
    }

    /// Create a buffer with the default capacity.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push a reading (producer only). Never blocks, never allocates.
    ///
    /// If the buffer was already holding `capacity` unread readings, the
    /// oldest one has just been overwritten and the overflow counter is
    /// incremented; the consumer learns about the loss only cumulatively.
    pub fn push(&self, record: ReadingRecord) {
        let head = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[(head % self.capacity) as usize];
        // SAFETY: single producer; the consumer never reads a slot at or
        // beyond the published head, so this write is unobserved until
        // the Release store below.
        unsafe {
            *slot.get() = record;
        }
        self.head.store(head + 1, Ordering::Release);

        let tail = self.tail.load(Ordering::Acquire);
        if head + 1 - tail > self.capacity {
            self.overflow.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drain every pending reading in arrival order (consumer only).
    ///
    /// The head is snapshotted once at entry, bounding the drain even
    /// while the producer keeps pushing. Readings overwritten before this
    /// call are skipped; they are accounted for in the overflow counter.
    pub fn drain(&self) -> Vec<ReadingRecord> {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        let start = tail.max(head.saturating_sub(self.capacity));

        let mut records = Vec::with_capacity((head - start) as usize);
        for seq in start..head {
            let slot = &self.slots[(seq % self.capacity) as usize];
            // SAFETY: single consumer; slots in [start, head) were
            // published by the Release store in `push` and are not
            // rewritten until the producer laps them.
            records.push(unsafe { *slot.get() });
        }
        self.tail.store(head, Ordering::Release);
        records
    }

    /// Return the overflow count and reset it to zero (consumer only).
    pub fn take_overflow(&self) -> u64 {
        self.overflow.swap(0, Ordering::AcqRel)
    }

    /// Drain and take the overflow count as one readout (consumer only).
    ///
    /// The counter is swapped after the record snapshot, so every loss
    /// shows up in this readout's count or a later one, never in none.
    pub fn drain_with_overflow(&self) -> Drained {
        let records = self.drain();
        let overflow = self.take_overflow();
        Drained { records, overflow }
    }

    /// Count a reading lost outside the buffer (hardware scan error).
    pub fn increment_overflow(&self) {
        self.overflow.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of unread readings currently held.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head - tail).min(self.capacity) as usize
    }

    /// Check if no readings are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }
}

// SAFETY: the producer is the only writer of `head` and of unpublished
// slots, the consumer the only writer of `tail`; all cross-context reads
// go through the atomics above.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32) -> ReadingRecord {
        ReadingRecord {
            signal: n,
            ..Default::default()
        }
    }

    #[test]
    fn push_then_drain_in_arrival_order() {
        let buffer = RingBuffer::new(16);
        for n in 1..=5 {
            buffer.push(record(n));
        }
        assert_eq!(buffer.len(), 5);

        let records = buffer.drain();
        let signals: Vec<u32> = records.iter().map(|r| r.signal).collect();
        assert_eq!(signals, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn overflow_overwrites_oldest() {
        let buffer = RingBuffer::new(1024);
        for n in 1..=1025 {
            buffer.push(record(n));
        }

        let drained = buffer.drain_with_overflow();
        assert_eq!(drained.overflow, 1);
        assert_eq!(drained.records.len(), 1024);
        // Record 1 was overwritten; 2..=1025 survive in arrival order.
        assert_eq!(drained.records[0].signal, 2);
        assert_eq!(drained.records[1023].signal, 1025);
    }

    #[test]
    fn exactly_full_is_not_an_overflow() {
        let buffer = RingBuffer::new(8);
        for n in 1..=8 {
            buffer.push(record(n));
        }
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.take_overflow(), 0);
        assert_eq!(buffer.drain().len(), 8);
    }

    #[test]
    fn second_drain_is_empty() {
        let buffer = RingBuffer::new(16);
        for n in 1..=3 {
            buffer.push(record(n));
        }

        assert_eq!(buffer.drain().len(), 3);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn error_losses_accumulate_with_overwrites() {
        let buffer = RingBuffer::new(4);
        buffer.increment_overflow();
        for n in 1..=6 {
            buffer.push(record(n));
        }

        // 1 hardware error + 2 overwrites (pushes 5 and 6).
        assert_eq!(buffer.take_overflow(), 3);
        assert_eq!(buffer.take_overflow(), 0);
    }

    #[test]
    fn sentinel_round_trips() {
        let buffer = RingBuffer::new(4);
        buffer.push(ReadingRecord::sentinel());
        let records = buffer.drain();
        assert!(records[0].is_error);
        assert_eq!(records[0].signal, 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::VecDeque;

        proptest! {
            /// Any interleaving of pushes and drains preserves arrival
            /// order and never reports more than capacity records.
            #[test]
            fn interleaved_push_drain_matches_model(
                ops in prop::collection::vec(0u8..=8, 1..64)
            ) {
                const CAPACITY: usize = 8;
                let buffer = RingBuffer::new(CAPACITY);
                let mut model: VecDeque<u32> = VecDeque::new();
                let mut lost = 0u64;
                let mut next = 0u32;

                for op in ops {
                    if op == 0 {
                        let drained = buffer.drain_with_overflow();
                        let signals: Vec<u32> =
                            drained.records.iter().map(|r| r.signal).collect();
                        let expected: Vec<u32> = model.drain(..).collect();
                        prop_assert_eq!(signals, expected);
                        prop_assert_eq!(drained.overflow, lost);
                        prop_assert!(drained.records.len() <= CAPACITY);
                        lost = 0;
                    } else {
                        for _ in 0..op {
                            buffer.push(record(next));
                            model.push_back(next);
                            if model.len() > CAPACITY {
                                model.pop_front();
                                lost += 1;
                            }
                            next += 1;
                        }
                    }
                }
            }
        }
    }
}
