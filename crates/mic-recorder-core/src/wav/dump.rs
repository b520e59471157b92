use crate::{AudioError, CoreResult};

use std::{
    fs::File,
    io::{BufWriter, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, instrument, warn};

const DUMP_PREFIX: &str = "DMP";
const DUMP_SUFFIX: &str = ".bin";

/// Append-only destination for drained PCM bytes.
pub trait SampleSink {
    /// Append bytes at the current end of the sink.
    fn append(&mut self, bytes: &[u8]) -> CoreResult<()>;
}

impl SampleSink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> CoreResult<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Temporary file receiving raw PCM during capture.
///
/// Writes only ever append; there is no seeking while capture runs.
pub struct RawDumpSink {
    writer: BufWriter<NamedTempFile>,
    path: PathBuf,
    bytes_written: u64,
}

impl RawDumpSink {
    /// Create a dump file in the system temp directory.
    #[track_caller]
    pub fn create() -> CoreResult<Self> {
        Self::create_in(std::env::temp_dir())
    }

    /// Create a dump file inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::FileIo`] if the file cannot be created.
    #[track_caller]
    #[instrument(skip(dir), fields(dir = ?dir.as_ref()))]
    pub fn create_in<P: AsRef<Path>>(dir: P) -> CoreResult<Self> {
        let dir = dir.as_ref();
        let file = tempfile::Builder::new()
            .prefix(DUMP_PREFIX)
            .suffix(DUMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| AudioError::FileIo {
                path: dir.to_path_buf(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let path = file.path().to_path_buf();
        debug!(path = ?path, "Raw dump created");

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            bytes_written: 0,
        })
    }

    /// Location of the dump file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and close the writer, handing the file over for reading.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::FileIo`] if buffered bytes cannot be flushed.
    #[track_caller]
    #[instrument(skip(self), fields(path = ?self.path, bytes = self.bytes_written))]
    pub fn close(self) -> CoreResult<RawDump> {
        let Self {
            writer,
            path,
            bytes_written,
        } = self;

        let file = writer.into_inner().map_err(|e| AudioError::FileIo {
            path: path.clone(),
            source: e.into_error(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        file.as_file().sync_all().map_err(|source| AudioError::FileIo {
            path: path.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(path = ?path, bytes = bytes_written, "Raw dump closed");

        Ok(RawDump {
            path: file.into_temp_path(),
            len: bytes_written,
        })
    }
}

impl SampleSink for RawDumpSink {
    #[track_caller]
    fn append(&mut self, bytes: &[u8]) -> CoreResult<()> {
        self.writer
            .write_all(bytes)
            .map_err(|source| AudioError::FileIo {
                path: self.path.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

/// Closed raw dump, readable by the finalizer.
///
/// Removed by [`delete`](RawDump::delete), or on drop if never deleted
/// explicitly.
pub struct RawDump {
    path: TempPath,
    len: u64,
}

impl RawDump {
    /// Location of the dump file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the dump.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the dump holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Open the dump for reading.
    #[track_caller]
    pub fn open(&self) -> CoreResult<File> {
        File::open(&self.path).map_err(|source| AudioError::FileIo {
            path: self.path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Remove the dump file.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::FileIo`] if the file cannot be removed.
    #[track_caller]
    pub fn delete(self) -> CoreResult<()> {
        let path = self.path.to_path_buf();
        self.path.close().map_err(|source| {
            warn!(path = ?path, error = %source, "Failed to delete raw dump");
            AudioError::FileIo {
                path,
                source,
                location: ErrorLocation::from(Location::caller()),
            }
        })?;
        debug!("Raw dump deleted");
        Ok(())
    }
}
