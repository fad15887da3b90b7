//! Scan descriptors
//!
//! A descriptor is fixed when acquisition starts and never mutated while
//! a conversion group is active.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a scan slot is sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelRole {
    /// Not connected; samples are discarded.
    #[default]
    Unused,
    /// The measured input.
    Signal,
    /// The internal reference voltage, used for calibration.
    Reference,
    /// The internal temperature sensor.
    Temperature,
}

/// How the conversion group is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    /// One software-triggered burst, awaited synchronously.
    SingleShot,
    /// Repeated bursts delivered via completion callback.
    Continuous,
}

/// Errors constructing a scan descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("scan descriptor needs at least one channel")]
    NoChannels,
    #[error("samples per channel must be nonzero")]
    ZeroDepth,
}

/// Immutable description of one conversion group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDescriptor {
    channels: Vec<ChannelRole>,
    samples_per_channel: usize,
    mode: ScanMode,
}

impl ScanDescriptor {
    /// Validate and build a descriptor.
    pub fn new(
        channels: Vec<ChannelRole>,
        samples_per_channel: usize,
        mode: ScanMode,
    ) -> Result<Self, DescriptorError> {
        if channels.is_empty() {
            return Err(DescriptorError::NoChannels);
        }
        if samples_per_channel == 0 {
            return Err(DescriptorError::ZeroDepth);
        }
        Ok(Self {
            channels,
            samples_per_channel,
            mode,
        })
    }

    /// Number of channels scanned per conversion.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Conversions per channel in one burst.
    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    /// Trigger mode of the group.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Expected burst length: samples per channel times channel count.
    pub fn burst_len(&self) -> usize {
        self.samples_per_channel * self.channels.len()
    }

    /// Role of the given channel index.
    pub fn role_of(&self, channel: usize) -> ChannelRole {
        self.channels[channel % self.channels.len()]
    }

    /// Whether any channel carries the given role.
    pub fn has_role(&self, role: ChannelRole) -> bool {
        self.channels.contains(&role)
    }
}
