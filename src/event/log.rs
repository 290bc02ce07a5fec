use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Event, EventKind};

/// Ordered, append-only sequence of recorded events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Timestamps never go backwards: an event stamped
    /// earlier than the current tail is clamped to the tail's timestamp.
    pub fn push(&mut self, mut event: Event) {
        if let Some(last) = self.events.last() {
            if event.ts_ms < last.ts_ms {
                tracing::debug!(
                    ts_ms = event.ts_ms,
                    tail_ms = last.ts_ms,
                    kind = event.kind_name(),
                    "clamping out-of-order event timestamp"
                );
                event.ts_ms = last.ts_ms;
            }
        }
        self.events.push(event);
    }

    pub fn record(&mut self, ts_ms: u64, kind: EventKind) {
        self.push(Event::new(ts_ms, kind));
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Timestamp of the last event, 0 for an empty log
    pub fn duration_ms(&self) -> u64 {
        self.events.last().map(|e| e.ts_ms).unwrap_or(0)
    }

    pub fn session_start_index(&self) -> Option<usize> {
        self.events
            .iter()
            .position(|e| matches!(e.kind, EventKind::SessionStart))
    }

    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.kind_name()).or_insert(0) += 1;
        }
        counts
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        let mut log = EventLog::new();
        for event in events {
            log.push(event);
        }
        log
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
