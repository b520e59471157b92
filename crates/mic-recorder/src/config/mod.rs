mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod output_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    output_config::OutputConfig,
};

pub(crate) const DEFAULT_SAMPLE_RATE: u32 = mic_recorder_core::audio::DEFAULT_SAMPLE_RATE;
pub(crate) const DEFAULT_BUFFER_COUNT: usize = mic_recorder_core::audio::DEFAULT_BUFFER_COUNT;
pub(crate) const DEFAULT_BUFFER_MILLIS: u64 = 1000;
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub(crate) const DEFAULT_STOP_HOTKEY: &str = "Escape";

pub(crate) fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

pub(crate) fn default_buffer_count() -> usize {
    DEFAULT_BUFFER_COUNT
}

pub(crate) fn default_buffer_millis() -> u64 {
    DEFAULT_BUFFER_MILLIS
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

pub(crate) fn default_stop_hotkey() -> String {
    DEFAULT_STOP_HOTKEY.to_string()
}
