//! Recorded event model
//!
//! A recording is a time-ordered [`EventLog`] of [`Event`]s. Each event carries
//! a millisecond offset from the start of the recording and a closed
//! [`EventKind`] payload. Events before [`EventKind::SessionStart`] describe
//! the world as it was when recording began; everything after it is live
//! activity.

mod log;
pub mod motion;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use log::EventLog;
pub use motion::{ActorMotion, Animation, AnimationSet, MotionFlags, ObjectMotion, Quat, Vec3};

/// Key under which an appearance snapshot was archived
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppearanceRef(String);

impl AppearanceRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AppearanceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Offset from recording start in milliseconds
    pub ts_ms: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(ts_ms: u64, kind: EventKind) -> Self {
        Self { ts_ms, kind }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    ActorAdded {
        actor_id: Uuid,
        first_name: String,
        last_name: String,
        /// `None` when the appearance archive refused the snapshot
        appearance: Option<AppearanceRef>,
    },
    ActorMoved {
        actor_id: Uuid,
        motion: ActorMotion,
    },
    ActorAppearanceChanged {
        actor_id: Uuid,
        appearance: AppearanceRef,
    },
    ActorAnimationChanged {
        actor_id: Uuid,
        animations: AnimationSet,
    },
    ActorRemoved {
        actor_id: Uuid,
    },
    ObjectAdded {
        object_id: Uuid,
        name: String,
    },
    ObjectMoved {
        object_id: Uuid,
        motion: ObjectMotion,
    },
    ObjectRemoved {
        object_id: Uuid,
    },
    ChatBroadcast {
        speaker_id: Uuid,
        text: String,
        channel: i32,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SessionStart => "SessionStart",
            EventKind::SessionEnd => "SessionEnd",
            EventKind::ActorAdded { .. } => "ActorAdded",
            EventKind::ActorMoved { .. } => "ActorMoved",
            EventKind::ActorAppearanceChanged { .. } => "ActorAppearanceChanged",
            EventKind::ActorAnimationChanged { .. } => "ActorAnimationChanged",
            EventKind::ActorRemoved { .. } => "ActorRemoved",
            EventKind::ObjectAdded { .. } => "ObjectAdded",
            EventKind::ObjectMoved { .. } => "ObjectMoved",
            EventKind::ObjectRemoved { .. } => "ObjectRemoved",
            EventKind::ChatBroadcast { .. } => "ChatBroadcast",
        }
    }

    /// Recorded actor identity this event refers to, if any
    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            EventKind::ActorAdded { actor_id, .. }
            | EventKind::ActorMoved { actor_id, .. }
            | EventKind::ActorAppearanceChanged { actor_id, .. }
            | EventKind::ActorAnimationChanged { actor_id, .. }
            | EventKind::ActorRemoved { actor_id } => Some(*actor_id),
            _ => None,
        }
    }
}
