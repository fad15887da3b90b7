//! Simulated scan driver
//!
//! Host-side stand-in for the converter hardware. Continuous mode runs a
//! dedicated producer thread with an atomic shutdown flag; single-shot
//! synthesizes one burst inline. Output is a deterministic xorshift
//! jitter around per-role midpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sample_aggregator::{ChannelRole, ScanDescriptor};

use crate::{DriverError, ScanDriver, ScanSink};

/// Synthetic signal parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Delay between continuous bursts.
    pub scan_interval_ms: u64,
    /// Midpoint code of signal-role samples.
    pub signal_midpoint: u16,
    /// Midpoint code of reference-role samples.
    pub reference_midpoint: u16,
    /// Midpoint code of temperature-role samples.
    pub temperature_midpoint: u16,
    /// Peak jitter applied around each midpoint.
    pub noise_span: u16,
    /// Seed for the jitter generator.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 100,
            signal_midpoint: 2048,
            // Expected codes for the internal reference and the
            // temperature sensor at room temperature on a 3.3 V rail.
            reference_midpoint: 1501,
            temperature_midpoint: 943,
            noise_span: 8,
            seed: 0x5eed_cafe,
        }
    }
}

struct Worker {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Software converter driving the `ScanSink` contract.
pub struct SimulatedScanDriver {
    config: SimulatorConfig,
    worker: Mutex<Option<Worker>>,
}

impl SimulatedScanDriver {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            worker: Mutex::new(None),
        }
    }

    fn synth_burst(config: &SimulatorConfig, descriptor: &ScanDescriptor, state: &mut u64) -> Vec<u16> {
        let channels = descriptor.channel_count();
        (0..descriptor.burst_len())
            .map(|i| {
                let midpoint = match descriptor.role_of(i % channels) {
                    ChannelRole::Signal => config.signal_midpoint,
                    ChannelRole::Reference => config.reference_midpoint,
                    ChannelRole::Temperature => config.temperature_midpoint,
                    ChannelRole::Unused => 0,
                };
                let span = u64::from(config.noise_span);
                if span == 0 {
                    return midpoint;
                }
                let jitter = (xorshift(state) % (2 * span + 1)) as i32 - span as i32;
                (i32::from(midpoint) + jitter).clamp(0, 4095) as u16
            })
            .collect()
    }
}

fn xorshift(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

impl ScanDriver for SimulatedScanDriver {
    fn single_shot(&self, descriptor: &ScanDescriptor) -> Result<Vec<u16>, DriverError> {
        let mut state = self.config.seed | 1;
        Ok(Self::synth_burst(&self.config, descriptor, &mut state))
    }

    fn start_continuous(
        &self,
        descriptor: &ScanDescriptor,
        sink: Arc<dyn ScanSink>,
    ) -> Result<(), DriverError> {
        let mut worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(DriverError::AlreadyRunning);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let config = self.config.clone();
        let descriptor = descriptor.clone();
        let handle = std::thread::spawn(move || {
            let mut state = config.seed | 1;
            let interval = Duration::from_millis(config.scan_interval_ms);
            while !flag.load(Ordering::SeqCst) {
                let burst = SimulatedScanDriver::synth_burst(&config, &descriptor, &mut state);
                sink.on_scan_complete(&burst);
                std::thread::sleep(interval);
            }
            debug!("scan producer thread exiting");
        });

        *worker = Some(Worker { shutdown, handle });
        Ok(())
    }

    fn stop_continuous(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.shutdown.store(true, Ordering::SeqCst);
            let _ = worker.handle.join();
        }
    }
}

impl Default for SimulatedScanDriver {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}
