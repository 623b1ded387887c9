use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Durable key-value storage that survives page loads within one browser
/// profile. The web shell backs this with `window.localStorage`.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("durable storage is unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("failed to read storage key '{key}': {reason}")]
    Read { key: String, reason: String },
    #[error("failed to write storage key '{key}': {reason}")]
    Write { key: String, reason: String },
}

/// In-memory storage. Clones share the same backing map, which is how tests
/// simulate a value persisting across a fresh load.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    entries: Option<Rc<RefCell<HashMap<String, String>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: Some(Rc::new(RefCell::new(HashMap::new()))),
        }
    }

    /// Storage whose every read and write fails, as in a private window
    /// with storage disabled.
    pub fn unavailable() -> Self {
        Self { entries: None }
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Some(entries) = &storage.entries {
            entries
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
        }
        storage
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| entries.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.as_ref().ok_or_else(|| StorageError::Read {
            key: key.to_string(),
            reason: "storage disabled".to_string(),
        })?;
        Ok(entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let entries = self.entries.as_ref().ok_or_else(|| StorageError::Write {
            key: key.to_string(),
            reason: "storage disabled".to_string(),
        })?;
        entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
