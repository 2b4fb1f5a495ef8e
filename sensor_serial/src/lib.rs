//! Serial sensor logging: reads `timestamp,heartrate,temperature,gsr` lines
//! off a serial port and appends the well-formed ones to a CSV file.

pub mod codec;
pub mod config;
pub mod error;
pub mod logger;
pub mod port;
pub mod record;
pub mod writer;

pub use config::LoggerConfig;
pub use error::{Error, Result};
pub use logger::{SensorLogger, StopReason};
pub use record::SensorRecord;
pub use writer::RecordWriter;
