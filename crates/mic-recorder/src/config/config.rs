//! Configuration management for mic-recorder.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation before recording, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, BehaviourConfig, OutputConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use global_hotkey::hotkey::HotKey;
use mic_recorder_core::{AudioFormat, RecorderSettings, audio::MIN_RING_BUFFERS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Audio capture configuration.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Application behavior settings.
    #[serde(default)]
    pub behaviour: BehaviourConfig,
    /// Recording output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from `path`, or from the platform config directory
    /// when `None`. A missing file is created with defaults.
    #[track_caller]
    #[instrument]
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, creating it with defaults
    /// if it does not exist.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!(config_path = ?config_path, "No config found, creating default");
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Check every value needed to start a recording.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate(&self) -> AppResult<()> {
        let audio = &self.audio;
        let reason = if audio.sample_rate == 0 {
            Some("audio.sample_rate must be non-zero".to_string())
        } else if audio.buffer_count < MIN_RING_BUFFERS {
            Some(format!(
                "audio.buffer_count must be at least {}, got {}",
                MIN_RING_BUFFERS, audio.buffer_count
            ))
        } else if audio.buffer_millis == 0 {
            Some("audio.buffer_millis must be non-zero".to_string())
        } else if audio.poll_interval_ms == 0 {
            Some("audio.poll_interval_ms must be non-zero".to_string())
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(AppError::ConfigError {
                reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.stop_hotkey()?;
        Ok(())
    }

    /// Parse the configured stop hotkey.
    #[track_caller]
    pub fn stop_hotkey(&self) -> AppResult<HotKey> {
        HotKey::from_str(&self.behaviour.stop_hotkey).map_err(|e| AppError::ConfigError {
            reason: format!(
                "Invalid behaviour.stop_hotkey {:?}: {}",
                self.behaviour.stop_hotkey, e
            ),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Session settings for the core recorder: mono 16-bit PCM at the
    /// configured rate.
    #[track_caller]
    pub fn recorder_settings(&self) -> AppResult<RecorderSettings> {
        let format = AudioFormat::new(self.audio.sample_rate, 1, 16)?;
        let buffer_len = RecorderSettings::buffer_len_for(
            &format,
            Duration::from_millis(self.audio.buffer_millis),
        );

        Ok(RecorderSettings {
            format,
            buffer_count: self.audio.buffer_count,
            buffer_len,
            poll_interval: Duration::from_millis(self.audio.poll_interval_ms),
            ..RecorderSettings::default()
        })
    }

    /// Output file for a session: `explicit` if given, otherwise
    /// `recording-<session>.wav` in the configured directory.
    pub fn output_path(&self, explicit: Option<&Path>, session_id: Uuid) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let file_name = format!("recording-{}.wav", session_id);
                match &self.output.directory {
                    Some(dir) => dir.join(file_name),
                    None => PathBuf::from(file_name),
                }
            }
        }
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(dir) = config_path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
            debug!(config_dir = ?dir, "Created config directory");
        }

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "mic-recorder", "Mic-Recorder").ok_or_else(|| {
                AppError::ConfigError {
                    reason: "Failed to get config directory".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
