use std::time::Duration;

use tokio::time::Interval;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

use crate::config::LoggerConfig;
use crate::error::{Error, Result};

/// Open the configured port as an async serial stream (8N1, no flow control).
///
/// Any failure, whether the device is missing, busy or the name is wrong,
/// comes back as [`Error::OpenPort`].
pub fn open_port(config: &LoggerConfig) -> Result<SerialStream> {
    let open_error = |source| Error::OpenPort {
        port: config.port.clone(),
        source,
    };

    debug!("Opening {} at {} baud", config.port, config.baud_rate);
    #[allow(unused_mut)]
    let mut port = tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout)
        .open_native_async()
        .map_err(open_error)?;

    #[cfg(unix)]
    port.set_exclusive(true).map_err(open_error)?;

    Ok(port)
}

/// Names of the serial ports the OS currently reports.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(std::io::Error::from)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Wait for a serial adapter to be plugged in and open it at `baud_rate`.
///
/// Polls the port list on every tick of `int`. A tick that brings more than
/// one new port is ignored, since there is no telling which one is the bench
/// adapter.
pub async fn detect_port(int: &mut Interval, baud_rate: u32) -> Result<SerialStream> {
    let mut last = available_ports()?;
    debug!("Looking for new ports from: {last:?}");

    loop {
        int.tick().await;
        let current = available_ports()?;
        if current == last {
            continue;
        }

        debug!("New port list: {current:?}");
        let new: Vec<&String> = current.iter().filter(|x| !last.contains(x)).collect();
        if new.len() != 1 {
            debug!("{} new serial ports found, ignoring", new.len());
            last = current;
            continue;
        }

        let new_serial = new[0].clone();
        debug!("Found new serial port: {new_serial}");
        last = current; // if it turns out we can't use this

        for _ in 0..10 {
            match tokio_serial::new(&new_serial, baud_rate).open_native_async() {
                Ok(port) => {
                    return Ok(port);
                }
                Err(error) => {
                    error!("Error opening port {new_serial}: {error:?}");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_port_is_an_open_error() {
        let config = LoggerConfig::default().with_port("/dev/does-not-exist-sensor");
        match open_port(&config) {
            Err(Error::OpenPort { port, .. }) => assert_eq!(port, "/dev/does-not-exist-sensor"),
            Err(other) => panic!("expected open error, got {other}"),
            Ok(_) => panic!("opened a port that does not exist"),
        }
    }
}
