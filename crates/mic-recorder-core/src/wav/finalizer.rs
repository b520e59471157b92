//! RIFF/WAVE container writer.
//!
//! Writes the header with placeholder size fields, streams the raw PCM
//! payload after it, then seeks back and patches both sizes.
//!
//! Layout (all integers little-endian):
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    file length - 8            (patched)
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16
//! [20-21]  1 (PCM)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate
//! [32-33]  block_align
//! [34-35]  bits_per_sample
//! [36-39]  "data"
//! [40-43]  declared data length       (patched)
//! [44..]   payload
//! ```

use crate::{AudioError, CoreResult, audio::AudioFormat};

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    panic::Location,
    path::Path,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Size of the header written before the payload.
pub const WAV_HEADER_SIZE: u64 = 44;

/// Offset of the RIFF size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

const FMT_CHUNK_SIZE: u32 = 16;
const PCM_FORMAT_TAG: u16 = 1;
const PLACEHOLDER: [u8; 4] = *b"----";

/// What the finalizer wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Payload bytes copied from the raw dump.
    pub payload_len: u64,
    /// Total length of the container.
    pub file_len: u64,
    /// Value written into the data chunk size field.
    pub declared_data_len: u32,
}

/// Write a complete container from a raw PCM stream.
///
/// The data chunk size is derived from `declared_seconds` through
/// [`AudioFormat::bytes_for_seconds`], not from the number of payload bytes.
/// The RIFF size is the real final length minus 8.
///
/// # Errors
///
/// Returns [`AudioError::ContainerOverflow`] if a size does not fit in 32
/// bits, or [`AudioError::FileIo`] (with an empty path) on stream failure.
#[track_caller]
pub fn write_container<R, W>(
    raw: &mut R,
    out: &mut W,
    format: &AudioFormat,
    declared_seconds: u32,
) -> CoreResult<ContainerSummary>
where
    R: Read,
    W: Write + Seek,
{
    let location = Location::caller();
    let io_err = |source: io::Error| AudioError::FileIo {
        path: Default::default(),
        source,
        location: ErrorLocation::from(location),
    };
    let overflow = |reason: String| AudioError::ContainerOverflow {
        reason,
        location: ErrorLocation::from(location),
    };

    let declared = format.bytes_for_seconds(declared_seconds);
    let declared_data_len = u32::try_from(declared).map_err(|_| {
        overflow(format!(
            "declared data length {} for {}s exceeds 32 bits",
            declared, declared_seconds
        ))
    })?;

    let start = out.stream_position().map_err(io_err)?;

    write_header(out, format).map_err(io_err)?;
    let data_size_pos = out.stream_position().map_err(io_err)? - 4;

    let payload_len = io::copy(raw, out).map_err(io_err)?;

    let file_len = out.stream_position().map_err(io_err)? - start;
    let riff_size = u32::try_from(file_len - 8)
        .map_err(|_| overflow(format!("container length {} exceeds 32 bits", file_len)))?;

    out.seek(SeekFrom::Start(data_size_pos)).map_err(io_err)?;
    out.write_all(&declared_data_len.to_le_bytes())
        .map_err(io_err)?;

    out.seek(SeekFrom::Start(start + RIFF_SIZE_OFFSET))
        .map_err(io_err)?;
    out.write_all(&riff_size.to_le_bytes()).map_err(io_err)?;

    out.seek(SeekFrom::Start(start + file_len)).map_err(io_err)?;
    out.flush().map_err(io_err)?;

    if u64::from(declared_data_len) != payload_len {
        debug!(
            declared = declared_data_len,
            payload = payload_len,
            "Declared data length differs from payload length"
        );
    }

    Ok(ContainerSummary {
        payload_len,
        file_len,
        declared_data_len,
    })
}

/// Write the container for `dump_path` into `wav_path`.
///
/// A partially written output file is removed when any step fails.
///
/// # Errors
///
/// Returns [`AudioError::FileIo`] naming the file that failed, or
/// [`AudioError::ContainerOverflow`].
#[track_caller]
#[instrument(skip(format), fields(sample_rate = format.sample_rate()))]
pub fn finalize_file(
    dump_path: &Path,
    wav_path: &Path,
    format: &AudioFormat,
    declared_seconds: u32,
) -> CoreResult<ContainerSummary> {
    let location = Location::caller();

    let dump = File::open(dump_path).map_err(|source| AudioError::FileIo {
        path: dump_path.to_path_buf(),
        source,
        location: ErrorLocation::from(location),
    })?;

    let output = File::create(wav_path).map_err(|source| AudioError::FileIo {
        path: wav_path.to_path_buf(),
        source,
        location: ErrorLocation::from(location),
    })?;

    let result = write_and_sync(
        BufReader::new(dump),
        BufWriter::new(output),
        wav_path,
        format,
        declared_seconds,
        location,
    );

    match result {
        Ok(summary) => {
            info!(
                path = ?wav_path,
                payload = summary.payload_len,
                file_len = summary.file_len,
                declared = summary.declared_data_len,
                "Container written"
            );
            Ok(summary)
        }
        Err(e) => {
            let e = with_path(e, wav_path);
            if let Err(remove_err) = fs::remove_file(wav_path) {
                warn!(path = ?wav_path, error = %remove_err, "Failed to remove partial output");
            } else {
                debug!(path = ?wav_path, "Removed partial output");
            }
            Err(e)
        }
    }
}

fn write_and_sync(
    mut reader: BufReader<File>,
    mut writer: BufWriter<File>,
    wav_path: &Path,
    format: &AudioFormat,
    declared_seconds: u32,
    location: &'static Location<'static>,
) -> CoreResult<ContainerSummary> {
    let summary = write_container(&mut reader, &mut writer, format, declared_seconds)?;

    let io_err = |source: io::Error| AudioError::FileIo {
        path: wav_path.to_path_buf(),
        source,
        location: ErrorLocation::from(location),
    };
    let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.sync_all().map_err(io_err)?;

    Ok(summary)
}

fn write_header<W: Write>(out: &mut W, format: &AudioFormat) -> io::Result<()> {
    out.write_all(b"RIFF")?;
    out.write_all(&PLACEHOLDER)?;
    out.write_all(b"WAVE")?;
    out.write_all(b"fmt ")?;

    out.write_all(&FMT_CHUNK_SIZE.to_le_bytes())?;
    out.write_all(&PCM_FORMAT_TAG.to_le_bytes())?;
    out.write_all(&format.channels().to_le_bytes())?;
    out.write_all(&format.sample_rate().to_le_bytes())?;
    out.write_all(&format.byte_rate().to_le_bytes())?;
    out.write_all(&format.block_align().to_le_bytes())?;
    out.write_all(&format.bits_per_sample().to_le_bytes())?;

    out.write_all(b"data")?;
    out.write_all(&PLACEHOLDER)
}

// Stream errors from write_container carry no path; name the output file.
fn with_path(error: AudioError, path: &Path) -> AudioError {
    match error {
        AudioError::FileIo {
            path: p,
            source,
            location,
        } if p.as_os_str().is_empty() => AudioError::FileIo {
            path: path.to_path_buf(),
            source,
            location,
        },
        other => other,
    }
}
