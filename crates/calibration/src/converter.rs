//! Fixed-point unit conversion
//!
//! All conversions multiply into a widened intermediate before dividing
//! by the calibrated reference estimate. Dividing first loses precision;
//! multiplying last in operand width overflows.

use serde::{Deserialize, Serialize};

use crate::{FULL_SCALE_CODE, VREFINT_NOMINAL_MV};

/// Named calibration parameters for unit conversion.
///
/// Defaults are the converter and sensor characteristics of the STM32F4
/// family: 12-bit full scale, 1.21 V internal reference, temperature
/// sensor at 760 mV / 25 °C with a 2.5 mV/°C slope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Full-scale output code of the converter.
    pub full_scale_code: u32,
    /// Nominal internal reference voltage (mV).
    pub nominal_reference_mv: u32,
    /// Temperature sensor output at 25 °C (mV).
    pub temperature_offset_mv: u32,
    /// Temperature sensor slope (µV per °C).
    pub temperature_slope_uv: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            full_scale_code: FULL_SCALE_CODE,
            nominal_reference_mv: VREFINT_NOMINAL_MV,
            temperature_offset_mv: 760,
            temperature_slope_uv: 2500,
        }
    }
}

/// Pure fixed-point conversion of raw codes into physical units.
///
/// Conversions are total: an ill-conditioned reference estimate (zero)
/// yields `None` instead of a division fault.
#[derive(Debug, Clone, Default)]
pub struct UnitConverter {
    config: ConverterConfig,
}

impl UnitConverter {
    /// Build a converter from named calibration parameters.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// The calibration parameters in use.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert a signal average to millivolts against the calibrated
    /// reference estimate.
    pub fn to_millivolts(&self, signal_average: u32, reference_estimate: u32) -> Option<u32> {
        if reference_estimate == 0 {
            return None;
        }
        let widened =
            u64::from(signal_average) * u64::from(self.config.nominal_reference_mv);
        Some((widened / u64::from(reference_estimate)) as u32)
    }

    /// Convert a temperature-channel average to milli-degrees Celsius.
    ///
    /// The code is taken to microvolts through the calibrated path, then
    /// the linear sensor law is applied around the 25 °C anchor.
    pub fn to_millicelsius(
        &self,
        temperature_average: u32,
        reference_estimate: u32,
    ) -> Option<i32> {
        if reference_estimate == 0 {
            return None;
        }
        let microvolts = (u64::from(temperature_average)
            * u64::from(self.config.nominal_reference_mv)
            * 1000
            / u64::from(reference_estimate)) as i64;
        let delta_uv = microvolts - i64::from(self.config.temperature_offset_mv) * 1000;
        let millicelsius =
            delta_uv * 1000 / i64::from(self.config.temperature_slope_uv) + 25_000;
        Some(millicelsius as i32)
    }

    /// Calibrated analog supply rail in millivolts: what a full-scale
    /// code corresponds to given the current reference estimate.
    pub fn supply_millivolts(&self, reference_estimate: u32) -> Option<u32> {
        self.to_millivolts(self.config.full_scale_code, reference_estimate)
    }
}
