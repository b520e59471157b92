use crate::config::default_stop_hotkey;

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Global hotkey that stops the recording, e.g. `Escape` or
    /// `ctrl+shift+KeyS`.
    #[serde(default = "default_stop_hotkey")]
    pub stop_hotkey: String,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            stop_hotkey: default_stop_hotkey(),
        }
    }
}
