//! Cache Engine Module
//!
//! Composition root tying the slot ring, key index, expiration policy,
//! refresh coordinator, and backend adapter together behind the public
//! save/load/remove/batch surface.
//!
//! All ring, cursor, and index mutation happens under one lock that is never
//! held across an await: the logical effect of a save (slot assignment,
//! cursor advance, index update) is established before the engine suspends
//! on the backend write. Loads for distinct identities never block on each
//! other; loads for the same identity share one in-flight refresh.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{MemoryBackend, StorageBackend, SyncBridge};
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::storage::expiry::{Clock, ExpirationPolicy, Expiry, SystemClock};
use crate::storage::index::KeyIndex;
use crate::storage::refresh::RefreshCoordinator;
use crate::storage::ring::{Identity, SlotRing};
use crate::storage::sync::{SyncRegistry, SyncRequest};

// == Engine State ==
/// Ring and index, mutated together under one lock so no stale index entry
/// is observable between an eviction and its de-indexing.
#[derive(Debug)]
struct EngineState {
    ring: SlotRing,
    index: KeyIndex,
}

// == Storage ==
/// Fixed-capacity, time-aware key-value cache over a pluggable backend.
///
/// Cheap to clone; clones share the same ring, index, and backend.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    state: Mutex<EngineState>,
    backend: Arc<dyn StorageBackend>,
    policy: ExpirationPolicy,
    clock: Arc<dyn Clock>,
    sync: SyncRegistry,
    refresh: RefreshCoordinator,
    namespace: String,
}

/// Outcome of the locked lookup phase of a load.
enum Lookup {
    /// Entry is resident and fresh in this slot
    Fresh(usize),
    /// Entry is missing or expired; the error to surface if no refresh runs
    Stale(StorageError),
}

impl Storage {
    // == Constructor ==
    /// Builds a cache instance from its configuration.
    ///
    /// Falls back to an in-memory backend and the system clock when the
    /// config names neither.
    pub fn new(config: StorageConfig) -> Self {
        let StorageConfig {
            size,
            default_expires_ms,
            namespace,
            backend,
            sync,
            clock,
        } = config;

        let backend =
            backend.unwrap_or_else(|| Arc::new(SyncBridge::new(MemoryBackend::new())));
        let clock: Arc<dyn Clock> = clock.unwrap_or_else(|| Arc::new(SystemClock));

        Self {
            inner: Arc::new(StorageInner {
                state: Mutex::new(EngineState {
                    ring: SlotRing::new(size),
                    index: KeyIndex::new(),
                }),
                backend,
                policy: ExpirationPolicy::new(default_expires_ms),
                clock,
                sync,
                refresh: RefreshCoordinator::new(),
                namespace,
            }),
        }
    }

    // == Save ==
    /// Stores `data` under `(key, id)`, superseding any prior entry with the
    /// same identity in place.
    ///
    /// `expires: None` applies the configured default TTL. Completion is
    /// signaled only after the backend confirms the write, but the slot
    /// assignment, cursor advance, and index update are already visible to
    /// other operations before that.
    pub async fn save<T>(
        &self,
        key: &str,
        id: Option<&str>,
        data: &T,
        expires: Option<Expiry>,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let raw =
            serde_json::to_string(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.save_raw(Identity::new(key, id), raw, expires).await
    }

    // == Load ==
    /// Retrieves the entry under `(key, id)`.
    ///
    /// A missing identity fails `NotFound` and a stale one fails `Expired`,
    /// unless a refresh function is configured for the identity, in which
    /// case the coordinator repopulates the entry and returns the fresh
    /// payload.
    pub async fn load<T>(&self, key: &str, id: Option<&str>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let identity = Identity::new(key, id);
        let value = self.load_value(&identity).await?;
        serde_json::from_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    // == Remove ==
    /// Destroys the entry under `(key, id)`.
    ///
    /// The slot is released (the cursor does not move) and the id leaves the
    /// key's group. Removing a nonexistent identity fails `NotFound`.
    pub async fn remove(&self, key: &str, id: Option<&str>) -> Result<()> {
        let identity = Identity::new(key, id);
        let slot = {
            let mut state = self.lock_state();
            match state.ring.release(&identity) {
                Some(slot) => {
                    state.index.remove(key, &identity.id);
                    slot
                }
                None => return Err(identity.not_found()),
            }
        };
        self.inner.backend.remove(&self.physical_key(slot)).await
    }

    // == Get All Data For Key ==
    /// Returns every resident payload under `key` in first-save order.
    ///
    /// Entries evicted, removed, or otherwise unreadable are silently absent;
    /// an individual failure never fails the whole batch.
    pub async fn get_all_data_for_key<T>(&self, key: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let ids: Vec<Option<String>> = self.lock_state().index.ids_for(key).to_vec();

        let mut payloads = Vec::with_capacity(ids.len());
        for id in ids {
            let identity = Identity {
                key: key.to_string(),
                id,
            };
            if let Ok(value) = self.load_value(&identity).await {
                if let Ok(payload) = serde_json::from_value(value) {
                    payloads.push(payload);
                }
            }
        }
        Ok(payloads)
    }

    // == Get Ids For Key ==
    /// Returns the ids resident under `key` in first-save order.
    ///
    /// `None` in the result is the default identity (an entry saved without
    /// an id).
    pub fn get_ids_for_key(&self, key: &str) -> Vec<Option<String>> {
        self.lock_state().index.ids_for(key).to_vec()
    }

    // == Clear Map For Key ==
    /// Removes every id under `key` from the ring, the index, and the
    /// backend.
    pub async fn clear_map_for_key(&self, key: &str) -> Result<()> {
        let slots: Vec<usize> = {
            let mut state = self.lock_state();
            let ids = state.index.clear(key);
            ids.into_iter()
                .filter_map(|id| {
                    state.ring.release(&Identity {
                        key: key.to_string(),
                        id,
                    })
                })
                .collect()
        };

        for slot in slots {
            self.inner.backend.remove(&self.physical_key(slot)).await?;
        }
        Ok(())
    }

    // == Clear All ==
    /// Empties the ring and index, resets the cursor to 0, and removes every
    /// physical key in this cache's namespace from the backend.
    pub async fn clear_all(&self) -> Result<()> {
        {
            let mut state = self.lock_state();
            state.ring.reset();
            state.index.reset();
        }

        let prefix = format!("{}/", self.inner.namespace);
        for physical_key in self.inner.backend.keys().await? {
            if physical_key.starts_with(&prefix) {
                self.inner.backend.remove(&physical_key).await?;
            }
        }

        debug!(namespace = %self.inner.namespace, "cleared cache");
        Ok(())
    }

    // == Diagnostics ==
    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.lock_state().ring.len()
    }

    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.lock_state().ring.is_empty()
    }

    /// Returns the fixed slot count N.
    pub fn capacity(&self) -> usize {
        self.lock_state().ring.capacity()
    }

    /// Returns the current cursor position (next slot to be written).
    pub fn cursor(&self) -> usize {
        self.lock_state().ring.cursor()
    }

    /// Returns the number of refreshes currently in flight.
    pub fn in_flight_refreshes(&self) -> usize {
        self.inner.refresh.in_flight_count()
    }

    // == Internals ==

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock().expect("engine state lock poisoned")
    }

    /// Physical keys derive from the slot index, not the logical identity,
    /// so slot reuse overwrites prior bytes regardless of prior identity.
    fn physical_key(&self, slot: usize) -> String {
        format!("{}/slot/{}", self.inner.namespace, slot)
    }

    /// Locked allocation phase followed by the backend write.
    async fn save_raw(&self, identity: Identity, raw: String, expires: Option<Expiry>) -> Result<()> {
        let now = self.inner.clock.now_ms();
        let expires_at = self.inner.policy.compute_expires_at(expires, now);

        let slot = {
            let mut state = self.lock_state();
            let allocation = state.ring.allocate(identity.clone(), expires_at);
            if let Some(evicted) = &allocation.evicted {
                state.index.remove(&evicted.key, &evicted.id);
                debug!(slot = allocation.slot, evicted = %evicted, "evicting slot occupant");
            }
            state.index.add(&identity.key, &identity.id);
            allocation.slot
        };

        self.inner.backend.set(&self.physical_key(slot), raw).await
    }

    /// Serializes and saves a JSON value; used by the refresh path.
    async fn save_value(&self, identity: &Identity, value: &Value, expires: Option<Expiry>) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.save_raw(identity.clone(), raw, expires).await
    }

    /// Resolves the identity to a payload, refreshing on miss or expiry when
    /// a refresh function is configured.
    async fn load_value(&self, identity: &Identity) -> Result<Value> {
        let now = self.inner.clock.now_ms();
        let lookup = {
            let state = self.lock_state();
            match state.ring.resolve(identity) {
                Some(slot) => {
                    let expires_at = state.ring.entry(slot).and_then(|entry| entry.expires_at);
                    if self.inner.policy.is_expired(expires_at, now) {
                        Lookup::Stale(identity.expired())
                    } else {
                        Lookup::Fresh(slot)
                    }
                }
                None => Lookup::Stale(identity.not_found()),
            }
        };

        match lookup {
            Lookup::Fresh(slot) => {
                match self.inner.backend.get(&self.physical_key(slot)).await? {
                    Some(raw) => serde_json::from_str(&raw)
                        .map_err(|e| StorageError::Serialization(e.to_string())),
                    None => {
                        // Resident metadata without backing bytes: the slot
                        // is effectively gone, so fall through to the miss
                        // handling.
                        warn!(slot, identity = %identity, "resident slot has no persisted bytes");
                        self.refresh_or(identity, identity.not_found()).await
                    }
                }
            }
            Lookup::Stale(miss) => self.refresh_or(identity, miss).await,
        }
    }

    /// Runs (or joins) the coalesced refresh for `identity`, or surfaces the
    /// miss error when no refresh function applies.
    async fn refresh_or(&self, identity: &Identity, miss: StorageError) -> Result<Value> {
        let Some(sync) = self.inner.sync.resolve(identity) else {
            return Err(miss);
        };

        let engine = self.clone();
        let owned = identity.clone();
        let fut = self.inner.refresh.join_or_start(identity, move || {
            let request = SyncRequest {
                key: owned.key.clone(),
                id: owned.id.clone(),
            };
            async move {
                let outcome = match sync(request).await {
                    // A successful refresh is persisted through a normal
                    // save, resetting expiry, before any waiter sees it.
                    Ok(value) => engine
                        .save_value(&owned, &value, None)
                        .await
                        .map(|_| value),
                    Err(e) => Err(e),
                };
                engine.inner.refresh.finish(&owned);
                outcome
            }
            .boxed()
        });

        fut.await
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Storage")
            .field("namespace", &self.inner.namespace)
            .field("capacity", &state.ring.capacity())
            .field("occupied", &state.ring.len())
            .field("cursor", &state.ring.cursor())
            .field("policy", &self.inner.policy)
            .finish()
    }
}
