//! Voltscan console - main entry point

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use acquisition::{AcquisitionConfig, ScanPipeline, SimulatedScanDriver, SimulatorConfig};
use console::{dispatch, render, Command};

/// Initialize logging
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== voltscan v{} ===", env!("CARGO_PKG_VERSION"));

    let driver = SimulatedScanDriver::new(SimulatorConfig::default());
    let pipeline = ScanPipeline::new(driver, AcquisitionConfig::default())?;

    println!("voltscan console; 'help' lists commands, 'quit' exits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match Command::parse(line) {
            Ok(command) => match dispatch(&pipeline, &command) {
                Ok(result) => println!("{}", render(&result)),
                Err(err) => println!("error: {err}"),
            },
            Err(err) => println!("{err}"),
        }
    }

    pipeline.stop();
    info!("console closed");
    Ok(())
}
