use std::time::Instant;

use uuid::Uuid;

/// Recording state for the hotkey handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not recording; the stop key is ignored.
    Idle,
    /// Currently recording audio.
    Recording {
        /// When recording started.
        started_at: Instant,
        /// Unique session ID for log correlation.
        session_id: Uuid,
    },
}

impl RecordingState {
    /// A recording that starts now.
    pub fn recording(session_id: Uuid) -> Self {
        RecordingState::Recording {
            started_at: Instant::now(),
            session_id,
        }
    }
}
