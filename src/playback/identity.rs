use std::collections::HashMap;

use uuid::Uuid;

/// Recorded identity → identity assigned by the dispatcher during playback.
/// Lives for one loaded session.
#[derive(Debug, Default)]
pub struct IdentityMap {
    map: HashMap<Uuid, Uuid>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, recorded: Uuid, dispatched: Uuid) {
        self.map.insert(recorded, dispatched);
    }

    pub fn resolve(&self, recorded: Uuid) -> Option<Uuid> {
        self.map.get(&recorded).copied()
    }

    pub fn contains(&self, recorded: Uuid) -> bool {
        self.map.contains_key(&recorded)
    }

    pub fn remove(&mut self, recorded: Uuid) -> Option<Uuid> {
        self.map.remove(&recorded)
    }

    /// Empty the map, returning every dispatched identity it held
    pub fn drain_dispatched(&mut self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.map.drain().map(|(_, dispatched)| dispatched).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
