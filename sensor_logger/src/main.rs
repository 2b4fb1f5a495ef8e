use std::process::ExitCode;

use sensor_serial::logger::start;
use sensor_serial::port::available_ports;
use sensor_serial::{Error, LoggerConfig, StopReason};
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let config = LoggerConfig::default();

    let mut logger = match start(&config) {
        Ok(logger) => logger,
        Err(err @ Error::OpenPort { .. }) => {
            eprintln!("[ERROR] Could not open port {}", config.port);
            error!("{err}");
            match available_ports() {
                Ok(ports) => warn!("Available ports: {ports:?}"),
                Err(err) => warn!("Could not list ports: {err}"),
            }
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("[ERROR] {err}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "[INFO] Connected to {} at {} baud.",
        config.port, config.baud_rate
    );
    info!("Writing to {}", config.output_path.display());
    println!("[INFO] Logging started. Press Ctrl+C to stop.\n");

    let mut code = ExitCode::SUCCESS;
    match logger.run(tokio::signal::ctrl_c()).await {
        Ok(StopReason::Interrupted) => println!("\n[INFO] Logging stopped by user."),
        Ok(StopReason::Disconnected) => {
            eprintln!("[ERROR] Port {} disconnected", config.port);
            code = ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("[ERROR] {err}");
            code = ExitCode::FAILURE;
        }
    }

    // The port is released before the file is flushed, so it is closed
    // even when the flush fails.
    match logger.shutdown() {
        Ok(true) => println!("[INFO] Port {} closed.", config.port),
        Ok(false) => {}
        Err(err) => {
            eprintln!("[ERROR] {err}");
            println!("[INFO] Port {} closed.", config.port);
            code = ExitCode::FAILURE;
        }
    }
    info!("{} records written", logger.records_written());
    code
}
