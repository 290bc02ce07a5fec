//! Storage names for session chunks: `session:<sessionId>:<chunkIndex>`.

use crate::session::SessionId;

pub const CHUNK_PREFIX: &str = "session:";

/// One bounded text segment of an encoded session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn name(&self, session_id: &SessionId) -> String {
        chunk_name(session_id, self.index)
    }
}

pub fn chunk_name(session_id: &SessionId, index: usize) -> String {
    format!("{CHUNK_PREFIX}{session_id}:{index}")
}

/// Split a stored name into its session id and chunk index. Returns `None`
/// for anything that is not a well-formed chunk name, including indices with
/// leading zeros.
pub fn parse_chunk_name(name: &str) -> Option<(SessionId, usize)> {
    let rest = name.strip_prefix(CHUNK_PREFIX)?;
    let (id, index) = rest.rsplit_once(':')?;
    let session_id = SessionId::parse(id).ok()?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if index.len() > 1 && index.starts_with('0') {
        return None;
    }
    let index = index.parse().ok()?;
    Some((session_id, index))
}

/// Split `text` into pieces of at most `max_chars` characters. Always yields
/// at least one piece so an empty payload still produces chunk 0.
pub fn split_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&text[start..]);
    pieces
}
