use uuid::Uuid;

/// Commands sent from the hotkey handler to the main application.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Stop the current recording session.
    StopRecording {
        /// Session ID of the recording to stop.
        session_id: Uuid,
    },
}
