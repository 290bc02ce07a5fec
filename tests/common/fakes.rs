//! Host-side fakes driven by the integration tests

use std::sync::atomic::{AtomicU64, Ordering};

use aar::capture::{ActorPresence, AppearanceArchive, AppearanceError};
use aar::event::{ActorMotion, Animation, AppearanceRef, Vec3};
use aar::playback::{Dispatch, DispatchError};
use parking_lot::Mutex;
use uuid::Uuid;

/// A call made against [`RecordingDispatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCall {
    Create {
        name: String,
        appearance: Option<String>,
        position: Vec3,
        assigned: Uuid,
    },
    Move(Uuid, Vec3),
    Appearance(Uuid, String),
    Animations(Uuid, Vec<Animation>),
    Delete(Uuid),
    Say(Uuid, String),
}

/// Dispatcher that hands out sequential ids and records every call
pub struct RecordingDispatch {
    calls: Mutex<Vec<DispatchCall>>,
    next_id: AtomicU64,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0x1000),
        }
    }

    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().clone()
    }

    pub fn moves_to(&self, position: Vec3) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, DispatchCall::Move(_, p) if *p == position))
            .count()
    }

    pub fn created(&self) -> Vec<Uuid> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DispatchCall::Create { assigned, .. } => Some(assigned),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DispatchCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch for RecordingDispatch {
    fn create_actor(
        &self,
        first_name: &str,
        last_name: &str,
        appearance: Option<&AppearanceRef>,
        position: Vec3,
    ) -> Result<Uuid, DispatchError> {
        let assigned = Uuid::from_u128(self.next_id.fetch_add(1, Ordering::SeqCst) as u128);
        self.calls.lock().push(DispatchCall::Create {
            name: format!("{first_name} {last_name}"),
            appearance: appearance.map(|a| a.to_string()),
            position,
            assigned,
        });
        Ok(assigned)
    }

    fn move_actor(&self, actor_id: Uuid, motion: &ActorMotion) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .push(DispatchCall::Move(actor_id, motion.position));
        Ok(())
    }

    fn set_actor_appearance(
        &self,
        actor_id: Uuid,
        appearance: &AppearanceRef,
    ) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .push(DispatchCall::Appearance(actor_id, appearance.to_string()));
        Ok(())
    }

    fn set_actor_animations(
        &self,
        actor_id: Uuid,
        animations: &[Animation],
    ) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .push(DispatchCall::Animations(actor_id, animations.to_vec()));
        Ok(())
    }

    fn delete_actor(&self, actor_id: Uuid) -> Result<(), DispatchError> {
        self.calls.lock().push(DispatchCall::Delete(actor_id));
        Ok(())
    }

    fn say(&self, actor_id: Uuid, text: &str, _channel: i32) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .push(DispatchCall::Say(actor_id, text.to_string()));
        Ok(())
    }
}

/// Appearance archive that remembers issued and discarded keys
#[derive(Default)]
pub struct MemoryArchive {
    pub issued: Mutex<Vec<String>>,
    pub discarded: Mutex<Vec<String>>,
}

impl AppearanceArchive for MemoryArchive {
    fn snapshot_appearance(
        &self,
        _world_id: Uuid,
        key: &str,
    ) -> Result<AppearanceRef, AppearanceError> {
        self.issued.lock().push(key.to_string());
        Ok(AppearanceRef::new(key))
    }

    fn discard_appearance(&self, appearance: &AppearanceRef) -> Result<(), AppearanceError> {
        self.discarded.lock().push(appearance.to_string());
        Ok(())
    }
}

pub fn presence(id: u128, first_name: &str, position: Vec3) -> ActorPresence {
    ActorPresence {
        world_id: Uuid::from_u128(id),
        first_name: first_name.into(),
        last_name: "Tester".into(),
        motion: ActorMotion::at(position),
        animations: Vec::new(),
    }
}
