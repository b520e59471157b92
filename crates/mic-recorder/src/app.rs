use crate::{AppCommand, AppError, AppResult, UiCommand};

use std::{
    panic::Location,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use mic_recorder_core::{RecorderSettings, RecordingSummary, record_microphone};
use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument};
use uuid::Uuid;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Main application state.
///
/// Runs on the async runtime thread. The recording itself blocks, so it runs
/// on the blocking pool and is stopped through a shared flag. Lifecycle
/// events go back to the main thread through `ui_proxy`.
pub struct App {
    pub(crate) session_id: Uuid,
    pub(crate) settings: RecorderSettings,
    pub(crate) device_name: Option<String>,
    pub(crate) output: PathBuf,
    pub(crate) ui_proxy: EventLoopProxy<UiCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) stop: Arc<AtomicBool>,
}

impl App {
    /// Record one session, then ask the main thread to exit with the
    /// session's exit code.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub(crate) async fn run(mut self) -> AppResult<RecordingSummary> {
        info!(output = ?self.output, "Mic-Recorder starting");

        let mut recording = {
            let settings = self.settings.clone();
            let device_name = self.device_name.clone();
            let output = self.output.clone();
            let stop = Arc::clone(&self.stop);
            tokio::task::spawn_blocking(move || {
                record_microphone(settings, device_name.as_deref(), &output, || {
                    stop.load(Ordering::Acquire)
                })
            })
        };

        let started_at = Instant::now();
        let mut progress = tokio::time::interval(PROGRESS_INTERVAL);
        progress.tick().await;

        let joined = loop {
            tokio::select! {
                joined = &mut recording => break joined,

                Some(AppCommand::StopRecording { session_id }) = self.command_rx.recv() => {
                    info!(session_id = %session_id, "Stopping recording");
                    self.stop.store(true, Ordering::Release);
                }

                _ = progress.tick() => {
                    if !self.stop.load(Ordering::Acquire) {
                        info!(
                            elapsed_s = started_at.elapsed().as_secs(),
                            "Recording, press the stop key to finish"
                        );
                    }
                }
            }
        };

        let result = match joined {
            Ok(recorded) => recorded.map_err(AppError::from),
            Err(e) => Err(AppError::TaskFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        };

        let code = match &result {
            Ok(summary) => {
                info!(
                    output = ?summary.output,
                    declared_seconds = summary.declared_seconds,
                    buffers = summary.buffers_drained,
                    "Recording has been saved"
                );
                0
            }
            Err(e) => e.exit_code(),
        };

        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.ui_proxy.send_event(UiCommand::Shutdown { code }) {
            error!(error = ?e, "Failed to signal shutdown to the main thread");
        }

        result
    }
}
