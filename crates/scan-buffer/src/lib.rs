//! Lossy Scan Reading Buffer
//!
//! Bounded SPSC ring buffer that hands averaged scan readings from the
//! conversion-complete context to the foreground console consumer. The
//! producer never blocks; when the consumer falls behind, the oldest
//! unread reading is overwritten and counted in the overflow counter.

mod buffer;

pub use buffer::{Drained, RingBuffer, DEFAULT_CAPACITY};

use serde::{Deserialize, Serialize};

/// One folded scan: per-role averages of a single hardware burst.
///
/// Produced exactly once per completed scan (or per scan error) by the
/// conversion-complete handler; read-only to the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// Average over the signal-role samples of the burst.
    pub signal: u32,
    /// Average over the reference-role samples of the burst.
    pub reference: u32,
    /// Average over the temperature-role samples of the burst.
    pub temperature: u32,
    /// Marks a scan that failed in hardware; signal carries no value.
    pub is_error: bool,
}

impl ReadingRecord {
    /// Sentinel for a failed scan: error flag set, zero signal.
    pub fn sentinel() -> Self {
        Self {
            is_error: true,
            ..Default::default()
        }
    }
}
