//! Mic-recorder Core Library
//!
//! Microphone capture through a small ring of recycled buffers, streamed to a
//! temporary raw dump and finalized into a RIFF/WAVE container.
//!
//! # Example
//!
//! ```no_run
//! use mic_recorder_core::{CoreResult, RecorderSettings, record_microphone};
//!
//! use std::{path::Path, time::{Duration, Instant}};
//!
//! fn main() -> CoreResult<()> {
//!     let deadline = Instant::now() + Duration::from_secs(3);
//!     let summary = record_microphone(
//!         RecorderSettings::default(),
//!         None,
//!         Path::new("recording.wav"),
//!         || Instant::now() >= deadline,
//!     )?;
//!
//!     println!("Saved {} seconds", summary.declared_seconds);
//!     Ok(())
//! }
//! ```

pub mod audio;
mod error;
pub mod wav;

pub use {
    audio::{AudioFormat, Recorder, RecorderSettings, RecordingSummary, record_microphone},
    error::AudioError,
    error::Result as CoreResult,
};

#[cfg(test)]
mod tests;
