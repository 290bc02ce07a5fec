//! Live-world notifications and the per-entity state the recorder keeps.

use uuid::Uuid;

use crate::event::{ActorMotion, AnimationSet, AppearanceRef, ObjectMotion};

/// What the host reports about an actor (avatar) present in the world
#[derive(Debug, Clone, PartialEq)]
pub struct ActorPresence {
    pub world_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub motion: ActorMotion,
    pub animations: AnimationSet,
}

/// What the host reports about a scene object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPresence {
    pub object_id: Uuid,
    pub name: String,
    pub motion: ObjectMotion,
}

/// Local chat said in the world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker_id: Uuid,
    pub text: String,
    pub channel: i32,
}

#[derive(Debug, Clone)]
pub struct TrackedActor {
    pub world_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub motion: ActorMotion,
    pub animations: AnimationSet,
    /// Appearance snapshots issued during the current recording
    pub appearances: Vec<AppearanceRef>,
    pub appearance_version: u32,
}

impl TrackedActor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Adopt the reported transform. Returns `false` when nothing changed.
    pub fn update_motion(&mut self, motion: &ActorMotion) -> bool {
        if self.motion == *motion {
            return false;
        }
        self.motion = *motion;
        true
    }

    /// Adopt the reported animation set. Returns `false` when nothing changed.
    pub fn update_animations(&mut self, animations: &AnimationSet) -> bool {
        if self.animations == *animations {
            return false;
        }
        self.animations = animations.clone();
        true
    }

    pub fn reset_appearances(&mut self) {
        self.appearances.clear();
        self.appearance_version = 0;
    }
}

impl From<&ActorPresence> for TrackedActor {
    fn from(presence: &ActorPresence) -> Self {
        Self {
            world_id: presence.world_id,
            first_name: presence.first_name.clone(),
            last_name: presence.last_name.clone(),
            motion: presence.motion,
            animations: presence.animations.clone(),
            appearances: Vec::new(),
            appearance_version: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub object_id: Uuid,
    pub name: String,
    pub motion: ObjectMotion,
}

impl TrackedObject {
    pub fn update_motion(&mut self, motion: &ObjectMotion) -> bool {
        if self.motion == *motion {
            return false;
        }
        self.motion = *motion;
        true
    }
}

impl From<&ObjectPresence> for TrackedObject {
    fn from(presence: &ObjectPresence) -> Self {
        Self {
            object_id: presence.object_id,
            name: presence.name.clone(),
            motion: presence.motion,
        }
    }
}
