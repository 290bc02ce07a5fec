use std::sync::Arc;

use crate::codec::{chunk_name, parse_chunk_name, Chunk, CodecError, SessionCodec, CHUNK_PREFIX};
use crate::event::EventLog;
use crate::storage::{Storage, StorageError};

use super::catalog::{list_sessions, SessionCatalog};
use super::SessionId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Saves and loads whole sessions on top of a [`Storage`] backend.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    codec: SessionCodec,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>, codec: SessionCodec) -> Self {
        Self { storage, codec }
    }

    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self::new(storage, SessionCodec::default())
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn list(&self) -> Result<SessionCatalog, SessionError> {
        Ok(list_sessions(self.storage.as_ref())?)
    }

    pub fn chunk_count(&self, session_id: &SessionId) -> Result<Option<usize>, SessionError> {
        Ok(self.list()?.get(session_id).copied())
    }

    /// Encode and write a log. Chunks left over from an earlier, longer save
    /// under the same id are removed. Returns the number of chunks written.
    pub fn save(&self, session_id: &SessionId, log: &EventLog) -> Result<usize, SessionError> {
        let previous = self.chunk_count(session_id)?.unwrap_or(0);
        let chunks = self.codec.encode(log)?;
        for chunk in &chunks {
            self.storage
                .write_text(&chunk.name(session_id), &chunk.text)?;
        }
        for stale in chunks.len()..previous {
            self.storage.delete(&chunk_name(session_id, stale))?;
        }
        tracing::info!(
            session_id = %session_id,
            events = log.len(),
            chunks = chunks.len(),
            "saved session"
        );
        Ok(chunks.len())
    }

    pub fn load(&self, session_id: &SessionId) -> Result<EventLog, SessionError> {
        let chunk_count = self
            .chunk_count(session_id)?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

        // The count comes from the highest index present, so a stray name can
        // make it arbitrarily large. Stop reading at the first gap.
        let mut chunks = Vec::new();
        for index in 0..chunk_count {
            let name = chunk_name(session_id, index);
            match self.storage.read_text(&name) {
                Ok(text) => chunks.push(Chunk { index, text }),
                Err(StorageError::NotFound(_)) => {
                    tracing::warn!(session_id = %session_id, index, chunk_count, "session has a missing chunk");
                    return Err(CodecError::missing_chunk(session_id, index).into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        let log = self.codec.decode(session_id, chunk_count, chunks)?;
        tracing::info!(
            session_id = %session_id,
            events = log.len(),
            chunks = chunk_count,
            "loaded session"
        );
        Ok(log)
    }

    /// Delete every chunk of one session. Returns how many were removed.
    pub fn delete(&self, session_id: &SessionId) -> Result<usize, SessionError> {
        let prefix = format!("{CHUNK_PREFIX}{session_id}:");
        let mut removed = 0;
        for name in self.storage.list_names(&prefix)? {
            if parse_chunk_name(&name).is_some() {
                self.storage.delete(&name)?;
                removed += 1;
            }
        }
        tracing::info!(session_id = %session_id, removed, "deleted session");
        Ok(removed)
    }

    /// Remove everything in the backing storage, sessions and appearance
    /// snapshots alike
    pub fn purge(&self) -> Result<usize, SessionError> {
        let names = self.storage.list_names("")?;
        for name in &names {
            self.storage.delete(name)?;
        }
        tracing::info!(removed = names.len(), "purged session storage");
        Ok(names.len())
    }
}
