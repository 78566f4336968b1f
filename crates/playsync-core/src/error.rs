//! Sync error handling
//!
//! Typed errors for the synchronization core. None of them is retried
//! automatically: terminal errors end the session and the user reloads.

use thiserror::Error;

/// Errors that can occur while attaching to a page or synchronizing playback
#[derive(Error, Debug)]
pub enum SyncError {
    /// No video element exists on the page
    #[error("No video element found on this page")]
    NoMediaFound,

    /// A session is already active on this page
    #[error("This page is already synchronized. Reload the page if it is not working.")]
    AlreadyAttached,

    /// The room connection never opened or was dropped
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// A room message carried a command outside the known vocabulary
    #[error("Unknown command: {0}")]
    UnrecognizedCommand(String),

    /// A sync message carried an event kind outside the known vocabulary
    #[error("Unknown event type: {0}")]
    UnrecognizedEvent(String),

    /// A message could not be interpreted at all
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// No room id was configured
    #[error("No room configured")]
    MissingRoom,

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Check if this error ends the session
    ///
    /// Protocol vocabulary errors are logged and ignored instead.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SyncError::UnrecognizedCommand(_)
                | SyncError::UnrecognizedEvent(_)
                | SyncError::MalformedMessage(_)
        )
    }

    /// Get a message suitable for showing to the user
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            SyncError::NoMediaFound => {
                Some("No video found. Open the room page and start from there.")
            }
            SyncError::AlreadyAttached => Some(
                "This page is already synchronized. If it is not working, reload the page and try again.",
            ),
            SyncError::TransportFailure(_) => Some("Sync error. Please reload!"),
            SyncError::MissingRoom => Some("Set a room with `playsync config set room <id>`."),
            _ => None,
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
