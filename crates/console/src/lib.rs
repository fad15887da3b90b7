//! Measurement Console
//!
//! Parses line commands, dispatches them against the acquisition
//! pipeline, and renders the structured results. Formatting is glue; the
//! semantic contract of each command lives in the `acquisition` crate.

use serde::Serialize;
use thiserror::Error;

use acquisition::{
    AcquisitionError, BufferedReadout, ReferenceReport, ScanDriver, ScanPipeline,
    SingleMeasurement, TemperatureMeasurement,
};

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One deep single-shot burst, averaged.
    Measure,
    /// One single-shot temperature burst.
    Temperature,
    /// Begin continuous acquisition.
    Start,
    /// Stop continuous acquisition.
    Stop,
    /// Drain buffered readings and the overflow count.
    Read,
    /// Report the calibration state; with a value, overwrite it.
    Reference(Option<u32>),
    /// List the available commands.
    Help,
}

/// Errors turning a line into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parse one console line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseError::Empty)?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(ParseError::Usage("one argument at most"));
        }

        match (verb, arg) {
            ("measure", None) => Ok(Command::Measure),
            ("measure", Some(_)) => Err(ParseError::Usage("measure")),
            ("temp", None) => Ok(Command::Temperature),
            ("temp", Some(_)) => Err(ParseError::Usage("temp")),
            ("start", None) => Ok(Command::Start),
            ("stop", None) => Ok(Command::Stop),
            ("read", None) => Ok(Command::Read),
            ("vref", None) => Ok(Command::Reference(None)),
            ("vref", Some(value)) => value
                .parse()
                .map(|v| Command::Reference(Some(v)))
                .map_err(|_| ParseError::Usage("vref [code]")),
            ("help", None) => Ok(Command::Help),
            _ => Err(ParseError::Unknown(verb.to_string())),
        }
    }
}

/// Structured outcome of a dispatched command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Measurement(SingleMeasurement),
    Temperature(TemperatureMeasurement),
    Started,
    Stopped,
    Readout(BufferedReadout),
    Reference(ReferenceReport),
    ReferenceSet { previous: u32, current: u32 },
    Help,
}

/// Run one command against the pipeline.
pub fn dispatch<D: ScanDriver>(
    pipeline: &ScanPipeline<D>,
    command: &Command,
) -> Result<CommandResult, AcquisitionError> {
    match command {
        Command::Measure => pipeline.measure_single().map(CommandResult::Measurement),
        Command::Temperature => pipeline
            .measure_temperature()
            .map(CommandResult::Temperature),
        Command::Start => pipeline.start_continuous().map(|()| CommandResult::Started),
        Command::Stop => {
            pipeline.stop();
            Ok(CommandResult::Stopped)
        }
        Command::Read => Ok(CommandResult::Readout(pipeline.read_buffered())),
        Command::Reference(None) => Ok(CommandResult::Reference(pipeline.reference())),
        Command::Reference(Some(value)) => {
            let previous = pipeline.set_reference(*value);
            Ok(CommandResult::ReferenceSet {
                previous,
                current: *value,
            })
        }
        Command::Help => Ok(CommandResult::Help),
    }
}

/// Render a result for the terminal.
pub fn render(result: &CommandResult) -> String {
    match result {
        CommandResult::Measurement(m) => {
            let mv = render_mv(m.millivolts);
            format!(
                "measured: {} (x4 oversampled: {})  {}",
                m.raw_average, m.oversampled, mv
            )
        }
        CommandResult::Temperature(t) => match t.millicelsius {
            Some(mc) => {
                let sign = if mc < 0 { "-" } else { "" };
                let abs = mc.unsigned_abs();
                format!(
                    "temperature: {} ({}{}.{:03} C)",
                    t.raw_average,
                    sign,
                    abs / 1000,
                    abs % 1000
                )
            }
            None => format!("temperature: {} (invalid reference)", t.raw_average),
        },
        CommandResult::Started => "continuous measurement started".to_string(),
        CommandResult::Stopped => "stopped".to_string(),
        CommandResult::Readout(readout) => {
            let mut out = String::new();
            for reading in &readout.readings {
                if reading.is_error {
                    out.push_str(&format!("{}: scan error\n", reading.index));
                } else {
                    out.push_str(&format!(
                        "{}: {}  {}  ref {}\n",
                        reading.index,
                        reading.signal_raw,
                        render_mv(reading.signal_mv),
                        reading.reference_raw
                    ));
                }
            }
            if readout.overflow > 0 {
                out.push_str(&format!("overflow: {}\n", readout.overflow));
            }
            if out.is_empty() {
                out.push_str("no readings pending\n");
            }
            out.trim_end().to_string()
        }
        CommandResult::Reference(report) => {
            let supply = render_mv(report.supply_mv);
            format!(
                "vref estimate: {} (nominal {} = {} mV)  supply {}",
                report.estimate, report.nominal_code, report.nominal_mv, supply
            )
        }
        CommandResult::ReferenceSet { previous, current } => {
            format!("vref estimate: {} (was {})", current, previous)
        }
        CommandResult::Help => "commands: measure | temp | start | stop | read | \
             vref [code] | help | quit"
            .to_string(),
    }
}

fn render_mv(millivolts: Option<u32>) -> String {
    match millivolts {
        Some(mv) => format!("{mv} mV"),
        None => "invalid reference".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acquisition::{AcquisitionConfig, SimulatedScanDriver, SimulatorConfig};

    fn quiet_pipeline() -> ScanPipeline<SimulatedScanDriver> {
        // Zero noise keeps every synthesized code at its midpoint.
        let driver = SimulatedScanDriver::new(SimulatorConfig {
            noise_span: 0,
            scan_interval_ms: 1,
            ..Default::default()
        });
        let config = AcquisitionConfig {
            buffer_capacity: 16,
            continuous_samples_per_channel: 4,
            single_shot_depth: 16,
            temperature_depth: 4,
            ..Default::default()
        };
        ScanPipeline::new(driver, config).unwrap()
    }

    #[test]
    fn parses_the_command_set() {
        assert_eq!(Command::parse("measure").unwrap(), Command::Measure);
        assert_eq!(Command::parse("  read ").unwrap(), Command::Read);
        assert_eq!(Command::parse("vref").unwrap(), Command::Reference(None));
        assert_eq!(
            Command::parse("vref 1501").unwrap(),
            Command::Reference(Some(1501))
        );
        assert_eq!(Command::parse("help").unwrap(), Command::Help);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(Command::parse("").unwrap_err(), ParseError::Empty);
        assert!(matches!(
            Command::parse("blink").unwrap_err(),
            ParseError::Unknown(_)
        ));
        assert!(matches!(
            Command::parse("vref fast").unwrap_err(),
            ParseError::Usage(_)
        ));
        assert!(matches!(
            Command::parse("measure now").unwrap_err(),
            ParseError::Usage(_)
        ));
    }

    #[test]
    fn measure_renders_calibrated_voltage() {
        let pipeline = quiet_pipeline();
        let result = dispatch(&pipeline, &Command::Measure).unwrap();

        match &result {
            CommandResult::Measurement(m) => {
                assert_eq!(m.raw_average, 2048);
                assert_eq!(m.oversampled, 8192);
                // 2048 * 1210 / 1501
                assert_eq!(m.millivolts, Some(1650));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(render(&result).contains("1650 mV"));
    }

    #[test]
    fn start_is_busy_the_second_time() {
        let pipeline = quiet_pipeline();
        dispatch(&pipeline, &Command::Start).unwrap();

        assert!(matches!(
            dispatch(&pipeline, &Command::Start),
            Err(AcquisitionError::Busy(_))
        ));

        dispatch(&pipeline, &Command::Stop).unwrap();
    }

    #[test]
    fn stop_always_succeeds() {
        let pipeline = quiet_pipeline();
        let result = dispatch(&pipeline, &Command::Stop).unwrap();
        assert!(matches!(result, CommandResult::Stopped));
    }

    #[test]
    fn vref_roundtrip() {
        let pipeline = quiet_pipeline();
        match dispatch(&pipeline, &Command::Reference(Some(1600))).unwrap() {
            CommandResult::ReferenceSet { previous, current } => {
                assert_eq!(previous, 1501);
                assert_eq!(current, 1600);
            }
            other => panic!("unexpected result {other:?}"),
        }
        match dispatch(&pipeline, &Command::Reference(None)).unwrap() {
            CommandResult::Reference(report) => assert_eq!(report.estimate, 1600),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_readout_renders_placeholder() {
        let pipeline = quiet_pipeline();
        let result = dispatch(&pipeline, &Command::Read).unwrap();
        assert_eq!(render(&result), "no readings pending");
    }

    #[test]
    fn results_serialize_to_json() {
        let pipeline = quiet_pipeline();
        let result = dispatch(&pipeline, &Command::Measure).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "measurement");
        assert_eq!(json["raw_average"], 2048);
    }
}
