//! Slot Ring Module
//!
//! Fixed-size circular slot allocator that bounds cache capacity.
//!
//! The ring owns exactly N slots for the engine's lifetime. A cursor points
//! to the next slot to be written and advances round-robin after every save
//! that consumes a slot, so eviction is strictly FIFO by write order
//! regardless of which keys are hot.

use std::collections::HashMap;
use std::fmt;

use crate::error::StorageError;

// == Identity ==
/// The (key, id) pair uniquely naming a logical entry.
///
/// `id: None` is the distinguished default identity: an entry saved without
/// an id, distinct from any caller-supplied id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Logical key grouping one or more entries
    pub key: String,
    /// Optional id distinguishing entries under the same key
    pub id: Option<String>,
}

impl Identity {
    // == Constructor ==
    /// Creates an identity from a key and optional id.
    pub fn new(key: impl Into<String>, id: Option<&str>) -> Self {
        Self {
            key: key.into(),
            id: id.map(str::to_string),
        }
    }

    /// Builds the `NotFound` error for this identity.
    pub fn not_found(&self) -> StorageError {
        StorageError::NotFound {
            key: self.key.clone(),
            id: self.id.clone(),
        }
    }

    /// Builds the `Expired` error for this identity.
    pub fn expired(&self) -> StorageError {
        StorageError::Expired {
            key: self.key.clone(),
            id: self.id.clone(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}@{}", self.key, id),
            None => write!(f, "{}", self.key),
        }
    }
}

// == Slot Entry ==
/// Metadata held for one occupied slot.
#[derive(Debug, Clone)]
pub struct SlotEntry {
    /// Identity of the entry stored in this slot
    pub identity: Identity,
    /// Expiration timestamp (Unix milliseconds), None = never expires
    pub expires_at: Option<u64>,
}

// == Allocation ==
/// Outcome of a slot allocation.
#[derive(Debug)]
pub struct Allocation {
    /// Slot index assigned to the identity
    pub slot: usize,
    /// Identity displaced from the slot, if the write evicted one
    pub evicted: Option<Identity>,
    /// True when the identity was already resident and updated in place
    pub in_place: bool,
}

// == Slot Ring ==
/// Fixed-capacity circular allocator mapping identities to physical slots.
#[derive(Debug)]
pub struct SlotRing {
    /// Per-slot metadata; None = empty slot
    slots: Vec<Option<SlotEntry>>,
    /// Index of the next slot to be written
    cursor: usize,
    /// Reverse lookup from identity to its slot
    positions: HashMap<Identity, usize>,
}

impl SlotRing {
    // == Constructor ==
    /// Creates a ring with `size` empty slots.
    ///
    /// # Panics
    /// Panics if `size` is zero; a zero-capacity ring cannot hold anything.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "slot ring size must be at least 1");
        Self {
            slots: (0..size).map(|_| None).collect(),
            cursor: 0,
            positions: HashMap::new(),
        }
    }

    // == Allocate ==
    /// Assigns a slot to `identity`.
    ///
    /// If the identity is already resident its slot is reused in place (the
    /// cursor does not move and no capacity is consumed). Otherwise the slot
    /// at the cursor is taken: any different identity occupying it is
    /// reported as evicted, and the cursor advances by 1 mod N.
    pub fn allocate(&mut self, identity: Identity, expires_at: Option<u64>) -> Allocation {
        if let Some(&slot) = self.positions.get(&identity) {
            self.slots[slot] = Some(SlotEntry {
                identity,
                expires_at,
            });
            return Allocation {
                slot,
                evicted: None,
                in_place: true,
            };
        }

        let slot = self.cursor;
        let evicted = self.slots[slot].take().map(|entry| {
            self.positions.remove(&entry.identity);
            entry.identity
        });

        self.positions.insert(identity.clone(), slot);
        self.slots[slot] = Some(SlotEntry {
            identity,
            expires_at,
        });
        self.cursor = (slot + 1) % self.slots.len();

        Allocation {
            slot,
            evicted,
            in_place: false,
        }
    }

    // == Resolve ==
    /// Returns the slot holding `identity`, if resident.
    pub fn resolve(&self, identity: &Identity) -> Option<usize> {
        self.positions.get(identity).copied()
    }

    // == Release ==
    /// Empties the slot holding `identity` and returns its index.
    ///
    /// The cursor does not move; the freed slot is reused only when the
    /// cursor wraps back onto it.
    pub fn release(&mut self, identity: &Identity) -> Option<usize> {
        let slot = self.positions.remove(identity)?;
        self.slots[slot] = None;
        Some(slot)
    }

    // == Entry ==
    /// Returns the metadata stored in `slot`, if occupied.
    pub fn entry(&self, slot: usize) -> Option<&SlotEntry> {
        self.slots.get(slot).and_then(|entry| entry.as_ref())
    }

    // == Reset ==
    /// Empties every slot and moves the cursor back to 0.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.positions.clear();
        self.cursor = 0;
    }

    // == Cursor ==
    /// Returns the index of the next slot to be written.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // == Capacity ==
    /// Returns the fixed slot count N.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    // == Length ==
    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    // == Is Empty ==
    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn ident(key: &str, id: Option<&str>) -> Identity {
        Identity::new(key, id)
    }

    #[test]
    fn test_ring_new() {
        let ring = SlotRing::new(4);
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.cursor(), 0);
        assert!(ring.is_empty());
    }

    #[test]
    #[should_panic(expected = "slot ring size must be at least 1")]
    fn test_ring_zero_size_panics() {
        SlotRing::new(0);
    }

    #[test]
    fn test_allocate_advances_cursor() {
        let mut ring = SlotRing::new(3);

        let a = ring.allocate(ident("a", None), None);
        assert_eq!(a.slot, 0);
        assert!(a.evicted.is_none());
        assert!(!a.in_place);
        assert_eq!(ring.cursor(), 1);

        let b = ring.allocate(ident("b", None), None);
        assert_eq!(b.slot, 1);
        assert_eq!(ring.cursor(), 2);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_allocate_same_identity_in_place() {
        let mut ring = SlotRing::new(3);

        ring.allocate(ident("a", Some("1")), None);
        let cursor_before = ring.cursor();

        let again = ring.allocate(ident("a", Some("1")), Some(99));
        assert_eq!(again.slot, 0);
        assert!(again.in_place);
        assert!(again.evicted.is_none());
        // In-place update must not consume capacity or advance the cursor
        assert_eq!(ring.cursor(), cursor_before);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.entry(0).unwrap().expires_at, Some(99));
    }

    #[test]
    fn test_allocate_wraps_and_evicts_fifo() {
        let mut ring = SlotRing::new(2);

        ring.allocate(ident("a", None), None);
        ring.allocate(ident("b", None), None);
        assert_eq!(ring.cursor(), 0);

        // Third distinct identity wraps onto slot 0 and evicts "a"
        let c = ring.allocate(ident("c", None), None);
        assert_eq!(c.slot, 0);
        assert_eq!(c.evicted, Some(ident("a", None)));
        assert_eq!(ring.resolve(&ident("a", None)), None);
        assert_eq!(ring.resolve(&ident("b", None)), Some(1));
        assert_eq!(ring.resolve(&ident("c", None)), Some(0));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_cursor_wraps_exactly_once_after_n_saves() {
        let mut ring = SlotRing::new(5);
        let start = ring.cursor();

        for i in 0..5 {
            ring.allocate(ident("key", Some(&i.to_string())), None);
        }

        assert_eq!(ring.cursor(), start);
    }

    #[test]
    fn test_release_leaves_cursor() {
        let mut ring = SlotRing::new(3);

        ring.allocate(ident("a", None), None);
        ring.allocate(ident("b", None), None);
        let cursor = ring.cursor();

        let slot = ring.release(&ident("a", None));
        assert_eq!(slot, Some(0));
        assert_eq!(ring.cursor(), cursor);
        assert_eq!(ring.resolve(&ident("a", None)), None);
        assert!(ring.entry(0).is_none());
    }

    #[test]
    fn test_release_unknown_identity() {
        let mut ring = SlotRing::new(2);
        assert_eq!(ring.release(&ident("ghost", None)), None);
    }

    #[test]
    fn test_default_id_distinct_from_explicit() {
        let mut ring = SlotRing::new(4);

        ring.allocate(ident("k", None), None);
        ring.allocate(ident("k", Some("1")), None);

        assert_eq!(ring.len(), 2);
        assert_ne!(
            ring.resolve(&ident("k", None)),
            ring.resolve(&ident("k", Some("1")))
        );
    }

    #[test]
    fn test_reset() {
        let mut ring = SlotRing::new(3);
        ring.allocate(ident("a", None), None);
        ring.allocate(ident("b", None), None);

        ring.reset();

        assert_eq!(ring.cursor(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.resolve(&ident("a", None)), None);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(ident("user", None).to_string(), "user");
        assert_eq!(ident("user", Some("42")).to_string(), "user@42");
    }
}
