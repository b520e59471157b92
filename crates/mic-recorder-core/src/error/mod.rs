use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording and container errors with source location tracking.
///
/// Every variant is fatal to the recording attempt it came from. Resources
/// acquired before the failure are released by the session before the error
/// reaches the caller.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The input device could not be opened with the requested format.
    #[error("Failed to open input device: {reason} {location}")]
    DeviceOpen {
        /// Description of the open failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A capture buffer could not be prepared for the device.
    #[error("Failed to prepare capture buffer {buffer}: {reason} {location}")]
    HeaderPrepare {
        /// Ring index of the buffer.
        buffer: usize,
        /// Description of the prepare failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A prepared capture buffer could not be queued with the device.
    #[error("Failed to enqueue capture buffer {buffer}: {reason} {location}")]
    HeaderEnqueue {
        /// Ring index of the buffer.
        buffer: usize,
        /// Description of the enqueue failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture could not be started.
    #[error("Failed to start capture: {reason} {location}")]
    Start {
        /// Description of the start failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The elapsed-time ticker thread could not be created.
    #[error("Failed to create elapsed-time ticker: {source} {location}")]
    TickerCreate {
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading or writing the raw dump or the output container failed.
    #[error("File I/O failed for {path:?}: {source} {location}")]
    FileIo {
        /// File being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio format parameters are inconsistent or unsupported.
    #[error("Invalid audio format: {reason} {location}")]
    InvalidFormat {
        /// Description of the invalid parameter.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recorder settings are out of range.
    #[error("Invalid recorder configuration: {reason} {location}")]
    InvalidConfiguration {
        /// Description of the invalid setting.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A RIFF size field would not fit in 32 bits.
    #[error("Container too large: {reason} {location}")]
    ContainerOverflow {
        /// Which size field overflowed.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed outside the open/prepare/start steps.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl AudioError {
    /// Underlying OS error code, when the failure came from the OS.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            AudioError::TickerCreate { source, .. } | AudioError::FileIo { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}

/// Result type alias using [`AudioError`].
pub type Result<T> = std::result::Result<T, AudioError>;
