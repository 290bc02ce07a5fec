use uuid::Uuid;

use crate::event::AppearanceRef;
use crate::session::SessionId;

#[derive(Debug, thiserror::Error)]
pub enum AppearanceError {
    /// The host has no appearance for this actor (e.g. already logged out).
    #[error("No appearance for actor {0}")]
    UnknownActor(Uuid),

    #[error("Appearance archive error: {0}")]
    Archive(String),
}

/// Persists actor appearance snapshots outside the event log. Appearance
/// payloads never enter the log; events only carry the returned reference.
pub trait AppearanceArchive: Send + Sync {
    /// Capture `world_id`'s current appearance under `key`
    fn snapshot_appearance(
        &self,
        world_id: Uuid,
        key: &str,
    ) -> Result<AppearanceRef, AppearanceError>;

    /// Drop a snapshot issued for a recording that will not be saved
    fn discard_appearance(&self, appearance: &AppearanceRef) -> Result<(), AppearanceError>;
}

/// `<sessionId>-appearance-<worldId>-<version>`
pub fn appearance_key(session_id: &SessionId, world_id: Uuid, version: u32) -> String {
    format!("{session_id}-appearance-{world_id}-{version}")
}
