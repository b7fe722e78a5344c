use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{PersistenceError, Result, StorageAdapter};

#[derive(Debug, Default)]
struct InMemoryStorageState {
    entries: HashMap<String, String>,
    writes: usize,
    fail_writes: bool,
    fail_reads: bool,
}

/// In-memory storage for tests and ephemeral sessions.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
}

impl InMemoryStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the storage to reject every subsequent write.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_writes = fail;
    }

    /// Configures the storage to fail every subsequent read.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_reads = fail;
    }

    /// Returns the number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .writes
    }

    /// Returns true if a blob is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(key)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageAdapter for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.fail_reads {
            return Err(PersistenceError::Storage("storage is unavailable".to_string()));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.fail_writes {
            return Err(PersistenceError::Storage("storage is read-only".to_string()));
        }
        state.entries.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let storage = InMemoryStorage::new();
        assert!(storage.get("k").unwrap().is_none());

        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.write_count(), 2);

        storage.clear("k").unwrap();
        assert!(!storage.contains("k"));
        storage.clear("k").unwrap();
    }

    #[test]
    fn clones_share_entries() {
        let storage = InMemoryStorage::new();
        let other = storage.clone();
        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn failing_writes_leave_entries_untouched() {
        let storage = InMemoryStorage::new();
        storage.set("k", "v").unwrap();
        storage.set_fail_writes(true);

        assert!(storage.set("k", "w").is_err());
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn failing_reads_are_not_corruption() {
        let storage = InMemoryStorage::new();
        storage.set("k", "v").unwrap();
        storage.set_fail_reads(true);

        let err = storage.get("k").unwrap_err();
        assert!(!err.is_corrupted());

        storage.set_fail_reads(false);
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }
}
