//! Consumer facade
//!
//! The synchronous command side of the pipeline. One active command at a
//! time is assumed; commands may block on their own I/O but never block
//! the producer.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use calibration::{CalibrationTracker, UnitConverter, VREFINT_NOMINAL_CODE, VREFINT_NOMINAL_MV};
use sample_aggregator::{
    ChannelRole, DescriptorError, SampleAggregator, ScanDescriptor, ScanMode,
};
use scan_buffer::RingBuffer;

use crate::{
    AcquisitionConfig, AcquisitionError, AcquisitionState, ModeController, ScanDriver,
    ScanProducer,
};

/// Result of a single-shot measurement.
#[derive(Debug, Clone, Serialize)]
pub struct SingleMeasurement {
    /// Plain average of the signal channel.
    pub raw_average: u32,
    /// Deep-burst average kept at four times the raw scale; the extra
    /// two bits are real resolution gained by oversampling.
    pub oversampled: u32,
    /// Calibrated signal voltage; `None` if the reference estimate is
    /// ill-conditioned.
    pub millivolts: Option<u32>,
}

/// Result of a single-shot temperature measurement.
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureMeasurement {
    /// Plain average of the temperature channel.
    pub raw_average: u32,
    /// Calibrated die temperature in milli-degrees Celsius.
    pub millicelsius: Option<i32>,
}

/// One drained reading, converted for display.
#[derive(Debug, Clone, Serialize)]
pub struct BufferedReading {
    /// Position within this readout, in arrival order.
    pub index: usize,
    /// Averaged raw signal code.
    pub signal_raw: u32,
    /// Calibrated signal voltage.
    pub signal_mv: Option<u32>,
    /// Averaged raw reference code.
    pub reference_raw: u32,
    /// Calibrated die temperature.
    pub temperature_mc: Option<i32>,
    /// The scan behind this reading failed in hardware.
    pub is_error: bool,
}

/// Everything pending in the buffer, plus losses since the last readout.
#[derive(Debug, Clone, Serialize)]
pub struct BufferedReadout {
    pub readings: Vec<BufferedReading>,
    pub overflow: u64,
}

/// Current calibration state.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceReport {
    /// Smoothed reference-channel code.
    pub estimate: u32,
    /// Code expected at the nominal supply.
    pub nominal_code: u32,
    /// Nominal reference voltage (mV).
    pub nominal_mv: u32,
    /// Calibrated analog supply rail (mV).
    pub supply_mv: Option<u32>,
}

/// The acquisition pipeline as seen by the console.
pub struct ScanPipeline<D: ScanDriver> {
    driver: D,
    mode: Arc<ModeController>,
    buffer: Arc<RingBuffer>,
    calibration: Arc<CalibrationTracker>,
    converter: UnitConverter,
    producer: Arc<ScanProducer>,
    single_shot: ScanDescriptor,
    temperature: ScanDescriptor,
}

impl<D: ScanDriver> ScanPipeline<D> {
    /// Wire the pipeline around a scan driver.
    pub fn new(driver: D, config: AcquisitionConfig) -> Result<Self, DescriptorError> {
        let continuous = ScanDescriptor::new(
            config.continuous_channels.clone(),
            config.continuous_samples_per_channel,
            ScanMode::Continuous,
        )?;
        let single_shot = ScanDescriptor::new(
            vec![ChannelRole::Signal],
            config.single_shot_depth,
            ScanMode::SingleShot,
        )?;
        let temperature = ScanDescriptor::new(
            vec![ChannelRole::Temperature, ChannelRole::Reference],
            config.temperature_depth,
            ScanMode::SingleShot,
        )?;

        let mode = Arc::new(ModeController::new());
        let buffer = Arc::new(RingBuffer::new(config.buffer_capacity));
        let calibration = Arc::new(CalibrationTracker::with_nominal());
        let producer = Arc::new(ScanProducer::new(
            continuous,
            buffer.clone(),
            calibration.clone(),
            mode.clone(),
        ));

        Ok(Self {
            driver,
            mode,
            buffer,
            calibration,
            converter: UnitConverter::new(config.converter),
            producer,
            single_shot,
            temperature,
        })
    }

    /// Current acquisition state.
    pub fn state(&self) -> AcquisitionState {
        self.mode.state()
    }

    /// Acquire one deep burst and average the signal channel.
    ///
    /// Rejected with a busy error while continuous acquisition runs; the
    /// two modes share the converter and the buffers.
    pub fn measure_single(&self) -> Result<SingleMeasurement, AcquisitionError> {
        self.mode.begin_single_shot()?;
        let result = self.run_measure_single();
        self.mode.finish_single_shot();
        result
    }

    fn run_measure_single(&self) -> Result<SingleMeasurement, AcquisitionError> {
        let burst = self.driver.single_shot(&self.single_shot)?;
        let fold = SampleAggregator::fold(&self.single_shot, &burst);
        if self.single_shot.has_role(ChannelRole::Reference) {
            self.calibration.update(fold.record.reference);
        }
        let oversampled = if fold.signal_count == 0 {
            0
        } else {
            (fold.signal_sum * 4 / fold.signal_count) as u32
        };
        Ok(SingleMeasurement {
            raw_average: fold.record.signal,
            oversampled,
            millivolts: self
                .converter
                .to_millivolts(fold.record.signal, self.calibration.estimate()),
        })
    }

    /// Acquire one temperature burst and convert it to milli-degrees.
    ///
    /// The group also samples the reference channel, so the calibration
    /// estimate is refreshed before the conversion.
    pub fn measure_temperature(&self) -> Result<TemperatureMeasurement, AcquisitionError> {
        self.mode.begin_single_shot()?;
        let result = self.run_measure_temperature();
        self.mode.finish_single_shot();
        result
    }

    fn run_measure_temperature(&self) -> Result<TemperatureMeasurement, AcquisitionError> {
        let burst = self.driver.single_shot(&self.temperature)?;
        let fold = SampleAggregator::fold(&self.temperature, &burst);
        self.calibration.update(fold.record.reference);
        let estimate = self.calibration.estimate();
        Ok(TemperatureMeasurement {
            raw_average: fold.record.temperature,
            millicelsius: self
                .converter
                .to_millicelsius(fold.record.temperature, estimate),
        })
    }

    /// Begin continuous acquisition.
    pub fn start_continuous(&self) -> Result<(), AcquisitionError> {
        self.mode.start_continuous()?;
        if let Err(err) = self
            .driver
            .start_continuous(self.producer.descriptor(), self.producer.clone())
        {
            // The driver refused; release the claim.
            self.mode.stop();
            return Err(err.into());
        }
        info!("continuous acquisition started");
        Ok(())
    }

    /// Stop continuous acquisition. Idempotent; always succeeds.
    pub fn stop(&self) {
        if self.mode.stop() == AcquisitionState::Continuous {
            self.driver.stop_continuous();
            info!("continuous acquisition stopped");
        }
    }

    /// Drain every pending reading in arrival order and report losses
    /// since the last readout. Conversion uses the calibration estimate
    /// current at drain time.
    pub fn read_buffered(&self) -> BufferedReadout {
        let drained = self.buffer.drain_with_overflow();
        let estimate = self.calibration.estimate();
        let readings = drained
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| BufferedReading {
                index,
                signal_raw: record.signal,
                signal_mv: (!record.is_error)
                    .then(|| self.converter.to_millivolts(record.signal, estimate))
                    .flatten(),
                reference_raw: record.reference,
                temperature_mc: (!record.is_error)
                    .then(|| self.converter.to_millicelsius(record.temperature, estimate))
                    .flatten(),
                is_error: record.is_error,
            })
            .collect();
        BufferedReadout {
            readings,
            overflow: drained.overflow,
        }
    }

    /// Report the calibration estimate and its nominal anchors.
    pub fn reference(&self) -> ReferenceReport {
        let estimate = self.calibration.estimate();
        ReferenceReport {
            estimate,
            nominal_code: VREFINT_NOMINAL_CODE,
            nominal_mv: VREFINT_NOMINAL_MV,
            supply_mv: self.converter.supply_millivolts(estimate),
        }
    }

    /// Overwrite the calibration estimate; returns the previous value.
    pub fn set_reference(&self, value: u32) -> u32 {
        self.calibration.overwrite(value)
    }
}
