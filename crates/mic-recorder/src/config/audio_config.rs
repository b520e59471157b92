use crate::config::{
    default_buffer_count, default_buffer_millis, default_poll_interval_ms, default_sample_rate,
};

use serde::{Deserialize, Serialize};

/// Audio capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected audio device name (None = default device).
    #[serde(default)]
    pub selected_device: Option<String>,
    /// Capture sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Buffers in the capture ring.
    #[serde(default = "default_buffer_count")]
    pub buffer_count: usize,
    /// Audio held by each buffer, in milliseconds.
    #[serde(default = "default_buffer_millis")]
    pub buffer_millis: u64,
    /// Longest wait for a completed buffer between stop-key checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            selected_device: None,
            sample_rate: default_sample_rate(),
            buffer_count: default_buffer_count(),
            buffer_millis: default_buffer_millis(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}
