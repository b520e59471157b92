use mic_recorder_core::AudioError;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Exit code used when no OS error code is available.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Application-level errors for the mic-recorder binary.
///
/// All variants include `ErrorLocation` for call-site tracking.
#[derive(Error, Debug)]
pub enum AppError {
    /// Audio subsystem error from mic-recorder-core.
    #[error("Audio error: {source} {location}")]
    Audio {
        /// The underlying audio error.
        #[source]
        source: AudioError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to register the global stop hotkey.
    #[error("Hotkey registration failed: {reason} {location}")]
    HotkeyRegistrationFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to send message through async channel.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading, saving or validation error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The recording task did not run to completion.
    #[error("Recording task failed: {reason} {location}")]
    TaskFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

impl AppError {
    /// Process exit code for this error: the OS error code when the failure
    /// carries one, otherwise [`FAILURE_EXIT_CODE`].
    pub fn exit_code(&self) -> i32 {
        let os_code = match self {
            AppError::Audio { source, .. } => source.os_code(),
            AppError::IoError { source, .. } => source.raw_os_error(),
            _ => None,
        };

        match os_code {
            Some(code) if code != 0 => code,
            _ => FAILURE_EXIT_CODE,
        }
    }
}

// Manual From<AudioError> with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<AudioError> for AppError {
    #[track_caller]
    fn from(source: AudioError) -> Self {
        AppError::Audio {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
