//! Playback engine: replays stored sessions through a [`Dispatch`].

mod dispatch;
mod driver;
mod identity;
mod player;

pub use dispatch::{Dispatch, DispatchError, TracingDispatch};
pub use driver::{drive, spawn_ticker, DriveSummary, TickerHandle};
pub use identity::IdentityMap;
pub use player::{
    AnomalyReason, PlaybackAnomaly, PlaybackPhase, Player, PlayerStatus, TickReport,
};

use crate::codec::CodecError;
use crate::session::{SessionError, SessionId, SessionIdError};
use crate::storage::StorageError;

/// Error type for player commands. A failed command leaves the player in the
/// phase it was in, except `load`, which may already have unloaded a
/// previously loaded session.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Already playing")]
    AlreadyPlaying,

    #[error("Not playing")]
    NotPlaying,

    #[error("No session loaded")]
    NothingLoaded,

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    MalformedSessionId(#[from] SessionIdError),

    #[error(transparent)]
    CorruptSession(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<SessionError> for PlaybackError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => PlaybackError::SessionNotFound(id),
            SessionError::Codec(e) => PlaybackError::CorruptSession(e),
            SessionError::Storage(e) => PlaybackError::Storage(e),
        }
    }
}
