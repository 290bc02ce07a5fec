//! Session persistence codec
//!
//! An [`EventLog`] is serialized to CBOR, gzip-compressed, base64-encoded and
//! split into [`Chunk`]s of at most `max_chunk_chars` characters. Decoding
//! reverses each step; any failure along the way is reported as
//! [`CodecError::CorruptSession`].

mod chunk;

use std::collections::BTreeMap;
use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::event::EventLog;
use crate::session::SessionId;

pub use chunk::{chunk_name, parse_chunk_name, split_text, Chunk, CHUNK_PREFIX};

pub const LOG_SCHEMA_VERSION: u32 = 1;

/// Reference chunk size limit of the storage backends this was built for
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 16_000_000;

/// Error type for encoding and decoding sessions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stored session cannot be turned back into a log.
    #[error("Corrupt session {session_id}: {reason}")]
    CorruptSession { session_id: String, reason: String },

    /// The log could not be serialized.
    #[error("Encode error: {0}")]
    Encode(String),
}

impl CodecError {
    pub(crate) fn missing_chunk(session_id: &SessionId, index: usize) -> Self {
        Self::corrupt(session_id, format!("missing chunk {index}"))
    }

    fn corrupt(session_id: &SessionId, reason: impl Into<String>) -> Self {
        CodecError::CorruptSession {
            session_id: session_id.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<L> {
    schema_version: u32,
    events: L,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionCodec {
    max_chunk_chars: usize,
}

impl Default for SessionCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

impl SessionCodec {
    pub fn new(max_chunk_chars: usize) -> Self {
        Self {
            max_chunk_chars: max_chunk_chars.max(1),
        }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    /// Encode a log into contiguous chunks numbered from 0
    pub fn encode(&self, log: &EventLog) -> Result<Vec<Chunk>, CodecError> {
        let text = encode_text(log)?;
        let chunks: Vec<Chunk> = split_text(&text, self.max_chunk_chars)
            .into_iter()
            .enumerate()
            .map(|(index, piece)| Chunk {
                index,
                text: piece.to_string(),
            })
            .collect();
        tracing::debug!(
            events = log.len(),
            encoded_chars = text.len(),
            chunks = chunks.len(),
            "encoded session log"
        );
        Ok(chunks)
    }

    /// Reassemble and decode `chunk_count` chunks. Chunks may arrive in any
    /// order; every index in `0..chunk_count` must be present exactly once.
    pub fn decode(
        &self,
        session_id: &SessionId,
        chunk_count: usize,
        chunks: impl IntoIterator<Item = Chunk>,
    ) -> Result<EventLog, CodecError> {
        let mut pieces: BTreeMap<usize, String> = BTreeMap::new();
        for chunk in chunks {
            if chunk.index >= chunk_count {
                return Err(CodecError::corrupt(
                    session_id,
                    format!("chunk {} outside expected range 0..{chunk_count}", chunk.index),
                ));
            }
            if pieces.insert(chunk.index, chunk.text).is_some() {
                return Err(CodecError::corrupt(
                    session_id,
                    format!("duplicate chunk {}", chunk.index),
                ));
            }
        }
        if chunk_count == 0 {
            return Err(CodecError::corrupt(session_id, "session has no chunks"));
        }

        // Walks only as far as the chunks actually supplied
        let mut text = String::new();
        for index in 0..chunk_count {
            match pieces.remove(&index) {
                Some(piece) => text.push_str(&piece),
                None => return Err(CodecError::missing_chunk(session_id, index)),
            }
        }

        decode_text(&text).map_err(|reason| CodecError::corrupt(session_id, reason))
    }
}

/// CBOR → gzip → base64
pub fn encode_text(log: &EventLog) -> Result<String, CodecError> {
    let envelope = Envelope {
        schema_version: LOG_SCHEMA_VERSION,
        events: log,
    };
    let mut cbor = Vec::new();
    ciborium::into_writer(&envelope, &mut cbor).map_err(|e| CodecError::Encode(e.to_string()))?;

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&cbor)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    let compressed = gz.finish().map_err(|e| CodecError::Encode(e.to_string()))?;

    Ok(STANDARD.encode(compressed))
}

/// base64 → gunzip → CBOR. Errors are plain reasons; callers attach the
/// session id.
pub fn decode_text(text: &str) -> Result<EventLog, String> {
    let compressed = STANDARD
        .decode(text.trim())
        .map_err(|e| format!("invalid base64: {e}"))?;

    let mut cbor = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut cbor)
        .map_err(|e| format!("decompression failed: {e}"))?;

    let envelope: Envelope<EventLog> = ciborium::from_reader(cbor.as_slice())
        .map_err(|e| format!("deserialization failed: {e}"))?;
    if envelope.schema_version != LOG_SCHEMA_VERSION {
        return Err(format!(
            "unsupported schema version {} (expected {LOG_SCHEMA_VERSION})",
            envelope.schema_version
        ));
    }
    Ok(envelope.events)
}
