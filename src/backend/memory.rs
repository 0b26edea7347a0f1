//! In-Memory Backend Module
//!
//! HashMap-backed blocking backend, the default when no other medium is
//! configured. Useful on its own and as the reference implementation for the
//! adapter contract in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::SyncBackend;
use crate::error::Result;

// == Memory Backend ==
/// Process-local key-value store with no persistence.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    // == Length ==
    /// Returns the number of stored physical keys.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("memory backend lock poisoned").len()
    }

    // == Is Empty ==
    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SyncBackend for MemoryBackend {
    fn get(&self, physical_key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("memory backend lock poisoned")
            .get(physical_key)
            .cloned())
    }

    fn set(&self, physical_key: &str, raw_value: String) -> Result<()> {
        self.entries
            .lock()
            .expect("memory backend lock poisoned")
            .insert(physical_key.to_string(), raw_value);
        Ok(())
    }

    fn remove(&self, physical_key: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("memory backend lock poisoned")
            .remove(physical_key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .expect("memory backend lock poisoned")
            .keys()
            .cloned()
            .collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_set_and_get() {
        let backend = MemoryBackend::new();

        backend.set("slot/3", "payload".to_string()).unwrap();
        assert_eq!(backend.get("slot/3").unwrap(), Some("payload".to_string()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_memory_backend_get_absent() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("ghost").unwrap(), None);
    }

    #[test]
    fn test_memory_backend_overwrite() {
        let backend = MemoryBackend::new();

        backend.set("slot/0", "old".to_string()).unwrap();
        backend.set("slot/0", "new".to_string()).unwrap();

        assert_eq!(backend.get("slot/0").unwrap(), Some("new".to_string()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_memory_backend_remove_absent_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.remove("ghost").is_ok());
        assert!(backend.is_empty());
    }
}
