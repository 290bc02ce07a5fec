use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::event::{EventKind, EventLog};

use super::SessionId;

/// Overview of a decoded session, as shown by `aar inspect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub chunks: usize,
    pub events: usize,
    pub duration_ms: u64,
    /// Distinct actors added during the session, snapshot included
    pub actors: usize,
    pub objects: usize,
    pub chat_lines: usize,
    pub has_session_start: bool,
    pub has_session_end: bool,
    pub kinds: BTreeMap<&'static str, usize>,
}

impl SessionSummary {
    pub fn new(session_id: SessionId, chunks: usize, log: &EventLog) -> Self {
        let mut actors = BTreeSet::new();
        let mut objects = BTreeSet::new();
        let mut chat_lines = 0;
        let mut has_session_end = false;

        for event in log {
            match &event.kind {
                EventKind::ActorAdded { actor_id, .. } => {
                    actors.insert(*actor_id);
                }
                EventKind::ObjectAdded { object_id, .. }
                | EventKind::ObjectMoved { object_id, .. } => {
                    objects.insert(*object_id);
                }
                EventKind::ChatBroadcast { .. } => chat_lines += 1,
                EventKind::SessionEnd => has_session_end = true,
                _ => {}
            }
        }

        Self {
            session_id,
            chunks,
            events: log.len(),
            duration_ms: log.duration_ms(),
            actors: actors.len(),
            objects: objects.len(),
            chat_lines,
            has_session_start: log.session_start_index().is_some(),
            has_session_end,
            kinds: log.kind_counts(),
        }
    }
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "session {} ({} chunks)", self.session_id, self.chunks)?;
        writeln!(
            f,
            "  {} events over {:.1}s, {} actors, {} objects, {} chat lines",
            self.events,
            self.duration_ms as f64 / 1000.0,
            self.actors,
            self.objects,
            self.chat_lines
        )?;
        if !self.has_session_end {
            writeln!(f, "  warning: no SessionEnd marker")?;
        }
        for (kind, count) in &self.kinds {
            writeln!(f, "  {kind:<24} {count}")?;
        }
        Ok(())
    }
}
