use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where recordings are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for recordings without an explicit output path
    /// (None = current directory).
    #[serde(default)]
    pub directory: Option<PathBuf>,
}
