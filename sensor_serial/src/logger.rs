use std::future::Future;
use std::io::Write;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::time::timeout;
use tokio_serial::SerialStream;
use tokio_util::codec::FramedRead;

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

use crate::codec::SensorLineCodec;
use crate::config::LoggerConfig;
use crate::error::Result;
use crate::port::open_port;
use crate::record::SensorRecord;
use crate::writer::RecordWriter;

/// Why [`SensorLogger::run`] returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StopReason {
    /// The shutdown future completed.
    Interrupted,
    /// The serial stream ended.
    Disconnected,
}

/// Open the configured port, then create the output file.
///
/// The file is only touched once the port is open, so a missing device
/// leaves any existing output as it was.
pub fn start(config: &LoggerConfig) -> Result<SensorLogger<SerialStream>> {
    let port = open_port(config)?;
    info!("Connected to {} at {} baud", config.port, config.baud_rate);
    let writer = RecordWriter::create(&config.output_path)?;
    Ok(SensorLogger::new(port, writer, config.read_timeout))
}

/// Reads sensor lines from a serial stream and appends the valid ones to a
/// CSV file, echoing each accepted record to the console.
///
/// Owns both resources. [`SensorLogger::shutdown`] releases them, and so
/// does dropping the logger.
pub struct SensorLogger<S> {
    port: Option<FramedRead<S, SensorLineCodec>>,
    writer: RecordWriter,
    console: Box<dyn Write + Send>,
    read_timeout: Duration,
    records_written: u64,
}

impl<S: AsyncRead + Unpin> SensorLogger<S> {
    pub fn new(port: S, writer: RecordWriter, read_timeout: Duration) -> Self {
        Self {
            port: Some(FramedRead::new(port, SensorLineCodec::default())),
            writer,
            console: Box::new(std::io::stdout()),
            read_timeout,
            records_written: 0,
        }
    }

    /// Send record echoes somewhere other than stdout.
    pub fn with_console(mut self, console: Box<dyn Write + Send>) -> Self {
        self.console = console;
        self
    }

    /// Read until `shutdown` completes or the stream ends.
    ///
    /// `shutdown` is raced against every read, so it takes effect even while
    /// a read is blocked waiting for data.
    pub async fn run<F: Future>(&mut self, shutdown: F) -> Result<StopReason> {
        tokio::pin!(shutdown);

        loop {
            let Some(port) = self.port.as_mut() else {
                return Ok(StopReason::Disconnected);
            };

            let read = tokio::select! {
                biased;
                _ = &mut shutdown => return Ok(StopReason::Interrupted),
                read = timeout(self.read_timeout, port.next()) => read,
            };

            match read {
                Ok(Some(Ok(record))) => self.accept(&record)?,
                Ok(Some(Err(error))) => return Err(error.into()),
                Ok(None) => {
                    debug!("Serial stream ended");
                    return Ok(StopReason::Disconnected);
                }
                Err(_) => {
                    trace!("Read timed out");
                    if let Some(record) = self.take_partial() {
                        self.accept(&record)?;
                    }
                }
            }
        }
    }

    /// Close the file and the serial stream.
    ///
    /// Returns whether anything was still open, so callers can report the
    /// release once. Calling it again is harmless.
    pub fn shutdown(&mut self) -> Result<bool> {
        let port_was_open = self.port.take().is_some();
        let writer_was_open = !self.writer.is_closed();
        self.writer.close()?;

        if port_was_open || writer_was_open {
            info!(
                "Released serial stream and {} ({} records written)",
                self.writer.path().display(),
                self.records_written
            );
        }
        Ok(port_was_open || writer_was_open)
    }

    pub fn is_closed(&self) -> bool {
        self.port.is_none() && self.writer.is_closed()
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    fn take_partial(&mut self) -> Option<SensorRecord> {
        let port = self.port.as_mut()?;
        let mut partial = port.read_buffer_mut().split();
        port.decoder_mut().take_partial(&mut partial)
    }

    fn accept(&mut self, record: &SensorRecord) -> Result<()> {
        self.writer.write_record(record)?;
        writeln!(self.console, "{:?}", record.fields())?;
        self.records_written += 1;
        trace!("Wrote record {}", self.records_written);
        Ok(())
    }
}

impl<S> Drop for SensorLogger<S> {
    fn drop(&mut self) {
        if let Err(error) = self.writer.close() {
            error!("Error closing {}: {error}", self.writer.path().display());
        }
    }
}
