use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{Storage, StorageError};

/// In-process storage, primarily for hosts that persist elsewhere and for tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn list_names(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .blobs
            .lock()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn read_text(&self, name: &str) -> Result<String, StorageError> {
        self.blobs
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn write_text(&self, name: &str, text: &str) -> Result<(), StorageError> {
        self.blobs.lock().insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.blobs.lock().remove(name);
        Ok(())
    }
}
