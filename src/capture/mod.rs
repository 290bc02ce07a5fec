//! Capture engine: tracks live entities and records their changes.

mod appearance;
mod recorder;
pub mod source;
mod tracked;

pub use appearance::{appearance_key, AppearanceArchive, AppearanceError};
pub use recorder::{CapturePhase, Recorder, RecorderStatus};
pub use source::{NotificationSource, SubscriptionId, WorldHub, WorldObserver};
pub use tracked::{ActorPresence, ChatMessage, ObjectPresence, TrackedActor, TrackedObject};

use crate::session::SessionError;

/// Error type for recorder commands. All of these leave the recorder in the
/// state it was in before the command.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    /// Save was requested while a recording is still running.
    #[error("Still recording")]
    StillRecording,

    /// Save was requested but there is no unsaved recording.
    #[error("No recorded session")]
    NoRecording,

    #[error("Failed to save session: {0}")]
    Session(#[from] SessionError),
}
