//! Host notification plumbing.
//!
//! The host environment reports world changes through a
//! [`NotificationSource`]; anything interested (the [`Recorder`]) registers a
//! [`WorldObserver`] with it. [`WorldHub`] is a ready-made in-process source
//! the host pushes notifications into.
//!
//! [`Recorder`]: super::Recorder

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::tracked::{ActorPresence, ChatMessage, ObjectPresence};

pub trait WorldObserver: Send + Sync {
    /// An actor became present (new arrival or promoted to a root agent)
    fn actor_added(&self, presence: &ActorPresence);
    /// Periodic presence update carrying the actor's current state
    fn actor_updated(&self, presence: &ActorPresence);
    fn actor_appearance_changed(&self, world_id: Uuid);
    fn actor_removed(&self, world_id: Uuid);
    fn object_added(&self, object: &ObjectPresence);
    fn object_updated(&self, object: &ObjectPresence);
    fn object_removed(&self, object_id: Uuid);
    fn chat(&self, message: &ChatMessage);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub trait NotificationSource: Send + Sync {
    fn subscribe(&self, observer: Arc<dyn WorldObserver>) -> SubscriptionId;
    /// Returns `false` if the subscription was unknown
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Fan-out notification source. Notifications may be published from any
/// thread; each is delivered to every observer registered at that moment.
#[derive(Default)]
pub struct WorldHub {
    next_id: AtomicU64,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn WorldObserver>)>>,
}

impl WorldHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    // Observers are called outside the lock so they may (un)subscribe.
    fn each(&self, f: impl Fn(&dyn WorldObserver)) {
        let observers: Vec<Arc<dyn WorldObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, o)| o.clone())
            .collect();
        for observer in observers {
            f(observer.as_ref());
        }
    }
}

impl NotificationSource for WorldHub {
    fn subscribe(&self, observer: Arc<dyn WorldObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.observers.write().push((id, observer));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }
}

impl WorldObserver for WorldHub {
    fn actor_added(&self, presence: &ActorPresence) {
        self.each(|o| o.actor_added(presence));
    }

    fn actor_updated(&self, presence: &ActorPresence) {
        self.each(|o| o.actor_updated(presence));
    }

    fn actor_appearance_changed(&self, world_id: Uuid) {
        self.each(|o| o.actor_appearance_changed(world_id));
    }

    fn actor_removed(&self, world_id: Uuid) {
        self.each(|o| o.actor_removed(world_id));
    }

    fn object_added(&self, object: &ObjectPresence) {
        self.each(|o| o.object_added(object));
    }

    fn object_updated(&self, object: &ObjectPresence) {
        self.each(|o| o.object_updated(object));
    }

    fn object_removed(&self, object_id: Uuid) {
        self.each(|o| o.object_removed(object_id));
    }

    fn chat(&self, message: &ChatMessage) {
        self.each(|o| o.chat(message));
    }
}
