use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::record::{SensorRecord, HEADER};

/// CSV output file. The header is written on creation; rows follow in the
/// order they are handed in.
pub struct RecordWriter {
    path: PathBuf,
    inner: Option<csv::Writer<File>>,
}

impl RecordWriter {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let output_error = |source| Error::Output {
            path: path.clone(),
            source,
        };

        let mut inner = csv::Writer::from_path(&path).map_err(output_error)?;
        inner.write_record(HEADER).map_err(output_error)?;
        debug!("Created {}", path.display());

        Ok(Self {
            path,
            inner: Some(inner),
        })
    }

    pub fn write_record(&mut self, record: &SensorRecord) -> Result<()> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Record writer is closed",
            )));
        };
        inner.write_record(record.fields()).map_err(|source| Error::Output {
            path: self.path.clone(),
            source,
        })
    }

    /// Flush and release the file. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut inner) = self.inner.take() {
            inner.flush()?;
            debug!("Closed {}", self.path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
