//! The surface playback drives to recreate recorded actors.

use std::sync::atomic::{AtomicUsize, Ordering};

use uuid::Uuid;

use crate::event::{ActorMotion, Animation, AppearanceRef, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Actor not found: {0}")]
    ActorNotFound(Uuid),

    #[error("Appearance unavailable: {0}")]
    Appearance(String),

    #[error("Dispatch failed: {0}")]
    Failed(String),
}

/// Host-side actor control (typically NPC creation and puppeting).
pub trait Dispatch: Send + Sync {
    /// Create an actor and return the identity the host assigned to it
    fn create_actor(
        &self,
        first_name: &str,
        last_name: &str,
        appearance: Option<&AppearanceRef>,
        position: Vec3,
    ) -> Result<Uuid, DispatchError>;

    fn move_actor(&self, actor_id: Uuid, motion: &ActorMotion) -> Result<(), DispatchError>;

    fn set_actor_appearance(
        &self,
        actor_id: Uuid,
        appearance: &AppearanceRef,
    ) -> Result<(), DispatchError>;

    fn set_actor_animations(
        &self,
        actor_id: Uuid,
        animations: &[Animation],
    ) -> Result<(), DispatchError>;

    fn delete_actor(&self, actor_id: Uuid) -> Result<(), DispatchError>;

    /// Have an actor say something in local chat. Hosts that cannot make
    /// actors speak keep the default.
    fn say(&self, _actor_id: Uuid, _text: &str, _channel: i32) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// Dry-run dispatcher: assigns fresh ids and logs every call.
#[derive(Debug, Default)]
pub struct TracingDispatch {
    created: AtomicUsize,
    deleted: AtomicUsize,
    calls: AtomicUsize,
}

impl TracingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actors_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn actors_deleted(&self) -> usize {
        self.deleted.load(Ordering::Relaxed)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl Dispatch for TracingDispatch {
    fn create_actor(
        &self,
        first_name: &str,
        last_name: &str,
        appearance: Option<&AppearanceRef>,
        position: Vec3,
    ) -> Result<Uuid, DispatchError> {
        self.count();
        self.created.fetch_add(1, Ordering::Relaxed);
        let id = Uuid::new_v4();
        tracing::info!(
            actor = %id,
            name = %format!("{first_name} {last_name}"),
            appearance = ?appearance.map(AppearanceRef::as_str),
            position = %position,
            "create actor"
        );
        Ok(id)
    }

    fn move_actor(&self, actor_id: Uuid, motion: &ActorMotion) -> Result<(), DispatchError> {
        self.count();
        tracing::debug!(
            actor = %actor_id,
            position = %motion.position,
            flying = motion.flags.flying,
            "move actor"
        );
        Ok(())
    }

    fn set_actor_appearance(
        &self,
        actor_id: Uuid,
        appearance: &AppearanceRef,
    ) -> Result<(), DispatchError> {
        self.count();
        tracing::info!(actor = %actor_id, appearance = %appearance, "set appearance");
        Ok(())
    }

    fn set_actor_animations(
        &self,
        actor_id: Uuid,
        animations: &[Animation],
    ) -> Result<(), DispatchError> {
        self.count();
        tracing::debug!(actor = %actor_id, count = animations.len(), "set animations");
        Ok(())
    }

    fn delete_actor(&self, actor_id: Uuid) -> Result<(), DispatchError> {
        self.count();
        self.deleted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(actor = %actor_id, "delete actor");
        Ok(())
    }

    fn say(&self, actor_id: Uuid, text: &str, channel: i32) -> Result<(), DispatchError> {
        self.count();
        tracing::info!(actor = %actor_id, channel, text, "say");
        Ok(())
    }
}
