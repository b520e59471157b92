//! Mic-Recorder: record the microphone to a WAV file until a global stop key
//! is pressed.

mod app;
mod app_command;
mod cli;
mod config;
mod error;
mod hotkey_handler;
mod recording_state;
#[cfg(test)]
mod tests;
mod ui_command;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    cli::Cli,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    recording_state::RecordingState,
    ui_command::UiCommand,
};

use crate::config::Config;

use std::sync::{Arc, atomic::AtomicBool};

use clap::Parser;
use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_LOG_FILTER: &str = "mic_recorder=info,mic_recorder_core=info";

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut cli = Some(Cli::parse());

    let event_loop = EventLoopBuilder::<UiCommand>::with_user_event().build();
    let ui_proxy = event_loop.create_proxy();

    // Persists across event loop iterations; dropping it unregisters the hotkey.
    let mut _hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(UiCommand::Shutdown { code }) => {
                info!(code, "Exiting");
                *control_flow = ControlFlow::ExitWithCode(code);
            }
            Event::NewEvents(StartCause::Init) => {
                let Some(cli) = cli.take() else {
                    return;
                };

                match launch(cli, ui_proxy.clone()) {
                    Ok(manager) => _hotkey_manager = Some(manager),
                    Err(e) => {
                        error!(error = ?e, "Failed to start recording");
                        std::process::exit(e.exit_code());
                    }
                }
            }
            _ => {}
        }
    });
}

/// Load configuration, register the stop key on the main thread and start
/// the async runtime that runs the recording.
fn launch(cli: Cli, ui_proxy: EventLoopProxy<UiCommand>) -> AppResult<GlobalHotKeyManager> {
    let config = Config::load(cli.config.as_deref())?;
    config.validate()?;

    let settings = config.recorder_settings()?;
    let device_name = cli.device.or_else(|| config.audio.selected_device.clone());
    let session_id = Uuid::new_v4();
    let output = config.output_path(cli.output.as_deref(), session_id);

    // Registered here because tao's event loop pumps the messages needed for
    // hotkey delivery.
    let (manager, hotkey_id) = HotkeyHandler::register_hotkey(config.stop_hotkey()?)?;

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    std::thread::Builder::new()
        .name("async-runtime".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create tokio runtime: {:?}", e);
                    std::process::exit(AppError::from(e).exit_code());
                }
            };

            rt.block_on(async {
                let hotkey_handler = HotkeyHandler::new(
                    hotkey_id,
                    RecordingState::recording(session_id),
                    command_tx,
                );

                let app = App {
                    session_id,
                    settings,
                    device_name,
                    output,
                    ui_proxy,
                    command_rx,
                    shutdown_tx,
                    stop: Arc::new(AtomicBool::new(false)),
                };

                tokio::join!(
                    async {
                        if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                            error!(error = ?e, "Hotkey handler error");
                        }
                    },
                    async {
                        if let Err(e) = app.run().await {
                            error!(session_id = %session_id, error = ?e, "Recording failed");
                        }
                    }
                );
            });
        })?;

    Ok(manager)
}
