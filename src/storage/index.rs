//! Key Index Module
//!
//! Secondary index grouping resident entries by key.
//!
//! Maps each key to the ordered list of ids currently resident in the ring,
//! in first-insertion order. The engine mutates this index in the same locked
//! step as the ring, so an id is listed here if and only if a live slot holds
//! that (key, id) pair.

use std::collections::HashMap;

// == Key Index ==
/// Mapping from key to the ordered ids resident under it.
#[derive(Debug, Default)]
pub struct KeyIndex {
    /// key -> ids in first-add order; `None` is the default identity
    map: HashMap<String, Vec<Option<String>>>,
}

impl KeyIndex {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Add ==
    /// Records `id` under `key`, appending in first-add order.
    ///
    /// Re-adding an id already present is a no-op, so in-place updates of an
    /// identity do not disturb group ordering.
    pub fn add(&mut self, key: &str, id: &Option<String>) {
        let ids = self.map.entry(key.to_string()).or_default();
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }

    // == Remove ==
    /// Removes `id` from under `key`; empty groups are dropped entirely.
    pub fn remove(&mut self, key: &str, id: &Option<String>) {
        if let Some(ids) = self.map.get_mut(key) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                self.map.remove(key);
            }
        }
    }

    // == Ids For ==
    /// Returns the ids resident under `key` in first-add order.
    pub fn ids_for(&self, key: &str) -> &[Option<String>] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    // == Clear ==
    /// Removes the whole group for `key`, returning the ids it held.
    pub fn clear(&mut self, key: &str) -> Vec<Option<String>> {
        self.map.remove(key).unwrap_or_default()
    }

    // == Reset ==
    /// Drops every group.
    pub fn reset(&mut self) {
        self.map.clear();
    }

    // == Keys ==
    /// Returns the number of keys with at least one resident id.
    pub fn key_count(&self) -> usize {
        self.map.len()
    }
}
