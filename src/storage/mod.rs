//! Named text storage for session chunks
//!
//! Sessions are persisted as a flat namespace of text blobs. The host decides
//! where those live (notecards in a storage prim, files, a database); the
//! engine only needs to list, read, write and delete them by name.

mod dir;
mod memory;

pub use dir::DirStorage;
pub use memory::MemoryStorage;

/// Error type for storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No blob stored under this name.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend cannot represent this name.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Storage: Send + Sync {
    /// Names starting with `prefix`, in ascending order
    fn list_names(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    fn read_text(&self, name: &str) -> Result<String, StorageError>;

    /// Create or replace the blob stored under `name`
    fn write_text(&self, name: &str, text: &str) -> Result<(), StorageError>;

    /// Remove a blob. Deleting a missing name is not an error.
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}
