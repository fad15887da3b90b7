//! Acquisition configuration

use serde::{Deserialize, Serialize};

use calibration::ConverterConfig;
use sample_aggregator::ChannelRole;
use scan_buffer::DEFAULT_CAPACITY;

/// Configuration for the sampling pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Readings held between console reads before the oldest is lost.
    pub buffer_capacity: usize,
    /// Channel roles of the continuous conversion group, in scan order.
    pub continuous_channels: Vec<ChannelRole>,
    /// Conversions per channel in one continuous burst.
    pub continuous_samples_per_channel: usize,
    /// Burst depth of the single-shot group. Deep on purpose: averaging
    /// 2048 conversions yields roughly two extra bits over the hardware
    /// resolution.
    pub single_shot_depth: usize,
    /// Conversions per channel for the temperature measurement group.
    pub temperature_depth: usize,
    /// Unit-conversion calibration parameters.
    pub converter: ConverterConfig,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            continuous_channels: vec![
                ChannelRole::Signal,
                ChannelRole::Signal,
                ChannelRole::Signal,
                ChannelRole::Signal,
                ChannelRole::Signal,
                ChannelRole::Signal,
                ChannelRole::Reference,
                ChannelRole::Temperature,
            ],
            continuous_samples_per_channel: 512,
            single_shot_depth: 2048,
            temperature_depth: 256,
            converter: ConverterConfig::default(),
        }
    }
}
