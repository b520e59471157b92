use std::path::PathBuf;

use clap::Parser;

/// Record the microphone to a WAV file until the stop key is pressed.
#[derive(Debug, Clone, Parser)]
#[command(name = "mic-recorder", version, about)]
pub struct Cli {
    /// Output WAV file. Defaults to `recording-<session>.wav` in the
    /// configured output directory.
    pub output: Option<PathBuf>,

    /// Capture from this input device instead of the configured one.
    #[arg(short, long)]
    pub device: Option<String>,

    /// Configuration file to load instead of the platform default.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
