use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: &str = "COM10";

pub const DEFAULT_BAUD_RATE: u32 = 115200;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Output file name, placed on the user's desktop.
pub const DEFAULT_OUTPUT_FILE: &str = "final-test-nihit.csv";

/// Everything the logger needs to know before it starts.
///
/// Built once at startup and handed to the port opener and the record
/// writer. There is no runtime configuration source: edit the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Serial port name (e.g. `COM10`, `/dev/ttyUSB0`)
    pub port: String,
    pub baud_rate: u32,
    /// How long a single line read may block
    pub read_timeout: Duration,
    pub output_path: PathBuf,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            output_path: desktop_dir().join(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl LoggerConfig {
    pub fn with_port(mut self, port: &str) -> Self {
        self.port = port.to_string();
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }
}

/// `~/Desktop`, or a relative `Desktop` when no home directory is known.
fn desktop_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_default()
        .join("Desktop")
}
