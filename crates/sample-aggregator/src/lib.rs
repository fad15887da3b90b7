//! Scan Burst Folding
//!
//! Describes a hardware scan (channel roles, depth, trigger mode) and
//! folds raw sample bursts into per-role averaged readings. Folding runs
//! in the conversion-complete context and is pure and bounded.

mod aggregator;
mod descriptor;

pub use aggregator::{Fold, SampleAggregator};
pub use descriptor::{ChannelRole, DescriptorError, ScanDescriptor, ScanMode};
