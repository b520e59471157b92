/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns the event loop and the hotkey registration, so
/// process lifecycle events flow through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Exit the event loop with the given process exit code.
    Shutdown {
        /// Process exit code.
        code: i32,
    },
}
