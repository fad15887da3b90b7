//! Acquisition Core
//!
//! Ties the sampling pipeline together: the compare-and-swap acquisition
//! state machine, the hardware scan boundary, the conversion-complete
//! producer, a simulated driver for host operation, and the consumer
//! facade that the console commands call into.

mod config;
mod driver;
mod error;
mod pipeline;
mod producer;
mod simulator;
mod state;

pub use config::AcquisitionConfig;
pub use driver::{ScanDriver, ScanSink};
pub use error::{AcquisitionError, DriverError};
pub use pipeline::{
    BufferedReading, BufferedReadout, ReferenceReport, ScanPipeline, SingleMeasurement,
    TemperatureMeasurement,
};
pub use producer::ScanProducer;
pub use simulator::{SimulatedScanDriver, SimulatorConfig};
pub use state::{AcquisitionState, ModeController};
