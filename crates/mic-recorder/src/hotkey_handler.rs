//! Global stop-key handler with recording state machine.
//!
//! Registers the configured stop key as a global hotkey and turns its first
//! press during a recording into a stop command for the application.

use crate::{AppCommand, AppError, AppResult, RecordingState};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Global hotkey handler with recording state machine.
pub struct HotkeyHandler {
    hotkey_id: u32,
    state: Arc<Mutex<RecordingState>>,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register `hotkey` as the global stop key.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkey to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkey(hotkey: HotKey) -> AppResult<(GlobalHotKeyManager, u32)> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register {:?}: {}", hotkey, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(hotkey = ?hotkey, "Stop hotkey registered");

        Ok((manager, hotkey.id()))
    }

    /// Create a handler for a previously registered hotkey.
    ///
    /// The `hotkey_id` should come from [`HotkeyHandler::register_hotkey`].
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(
        hotkey_id: u32,
        initial: RecordingState,
        command_tx: mpsc::Sender<AppCommand>,
    ) -> Self {
        Self {
            hotkey_id,
            state: Arc::new(Mutex::new(initial)),
            command_tx,
        }
    }

    /// Current recording state.
    pub async fn state(&self) -> RecordingState {
        *self.state.lock().await
    }

    /// Run the hotkey handler event loop.
    ///
    /// This method blocks until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // Forwards blocking hotkey events into the async loop. Exits on the
        // first failed send once event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if event.id == self.hotkey_id && event.state == HotKeyState::Pressed {
                        self.handle_hotkey_press().await?;
                    }
                }
            }
        }

        drop(event_rx);

        // The forwarder may sit in recv() until the next key event.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// React to one press of the stop key.
    #[instrument(skip(self))]
    pub async fn handle_hotkey_press(&self) -> AppResult<()> {
        let mut state = self.state.lock().await;

        match *state {
            RecordingState::Idle => {
                debug!("Stop key pressed with no active recording");
            }
            RecordingState::Recording {
                started_at,
                session_id,
            } => {
                let duration = started_at.elapsed();

                // Send command FIRST -- if this fails, state remains Recording.
                // The user can retry by pressing the hotkey again.
                self.command_tx
                    .send(AppCommand::StopRecording { session_id })
                    .await
                    .map_err(|e| AppError::ChannelSendFailed {
                        message: format!("Failed to send StopRecording: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                *state = RecordingState::Idle;

                info!(
                    session_id = %session_id,
                    duration_ms = duration.as_millis(),
                    "Stop key pressed"
                );
            }
        }

        Ok(())
    }
}
