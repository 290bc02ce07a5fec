//! Session discovery from stored chunk names.

use std::collections::BTreeMap;

use crate::codec::{parse_chunk_name, CHUNK_PREFIX};
use crate::storage::{Storage, StorageError};

use super::SessionId;

/// Map of session id → chunk count (highest index seen + 1)
pub type SessionCatalog = BTreeMap<SessionId, usize>;

/// Scan storage for `session:<id>:<n>` names
pub fn list_sessions(storage: &dyn Storage) -> Result<SessionCatalog, StorageError> {
    let names = storage.list_names(CHUNK_PREFIX)?;
    Ok(catalog_from_names(names.iter().map(String::as_str)))
}

/// Build a catalog from raw names. Malformed names are skipped.
pub fn catalog_from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> SessionCatalog {
    let mut sessions = SessionCatalog::new();
    for name in names {
        let Some((session_id, index)) = parse_chunk_name(name) else {
            tracing::trace!(name, "ignoring non-session name");
            continue;
        };
        let Some(count) = index.checked_add(1) else {
            tracing::trace!(name, "ignoring chunk name with out-of-range index");
            continue;
        };
        let entry = sessions.entry(session_id).or_insert(0);
        *entry = (*entry).max(count);
    }
    sessions
}
