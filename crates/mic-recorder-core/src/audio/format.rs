use crate::{AudioError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// Default session sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// PCM format of one recording session.
///
/// `block_align` and `byte_rate` are derived once in [`AudioFormat::new`] and
/// never recomputed, so every place that emits them agrees with the base
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    block_align: u16,
    byte_rate: u32,
}

impl AudioFormat {
    /// Build a PCM format, deriving block align and byte rate.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::InvalidFormat`] for a zero sample rate, zero
    /// channels, a bit depth that is not a non-zero multiple of 8, or derived
    /// values that overflow their header fields.
    #[track_caller]
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> CoreResult<Self> {
        let invalid = |reason: String| AudioError::InvalidFormat {
            reason,
            location: ErrorLocation::from(Location::caller()),
        };

        if sample_rate == 0 {
            return Err(invalid("sample rate must be non-zero".to_string()));
        }
        if channels == 0 {
            return Err(invalid("channel count must be non-zero".to_string()));
        }
        if bits_per_sample == 0 || bits_per_sample % 8 != 0 {
            return Err(invalid(format!(
                "bits per sample must be a non-zero multiple of 8, got {}",
                bits_per_sample
            )));
        }

        let block_align = u32::from(channels) * u32::from(bits_per_sample) / 8;
        let block_align = u16::try_from(block_align)
            .map_err(|_| invalid(format!("block align {} exceeds 16 bits", block_align)))?;
        let byte_rate = sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| invalid("byte rate exceeds 32 bits".to_string()))?;

        Ok(Self {
            sample_rate,
            channels,
            bits_per_sample,
            block_align,
            byte_rate,
        })
    }

    /// Samples per second per channel.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Bits in one sample of one channel.
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Bytes per frame (`channels * bits_per_sample / 8`).
    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    /// Average bytes per second (`sample_rate * block_align`).
    pub fn byte_rate(&self) -> u32 {
        self.byte_rate
    }

    /// Data length declared for a recording of `seconds` seconds.
    ///
    /// Computed as `sample_rate * seconds * bits_per_sample / 8`. The channel
    /// count is deliberately not part of the product; sessions are mono.
    pub fn bytes_for_seconds(&self, seconds: u32) -> u64 {
        u64::from(self.sample_rate) * u64::from(seconds) * u64::from(self.bits_per_sample) / 8
    }
}

impl Default for AudioFormat {
    /// 44.1 kHz, mono, 16-bit PCM.
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
            block_align: 2,
            byte_rate: DEFAULT_SAMPLE_RATE * 2,
        }
    }
}
