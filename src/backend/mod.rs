//! Backend Adapter Module
//!
//! Uniform get/set/remove/keys contract over a concrete storage medium.
//!
//! The engine talks to every backend through the asynchronous
//! [`StorageBackend`] trait. Backends that complete synchronously implement
//! [`SyncBackend`] instead and are lifted through [`SyncBridge`], so engine
//! logic is written once regardless of backend synchrony.
//!
//! Physical keys are derived from slot indexes, never from logical keys, so
//! reusing a slot overwrites the prior occupant's bytes regardless of which
//! identity wrote them.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;

use crate::error::Result;

// == Storage Backend ==
/// Asynchronous byte/string-oriented store consumed by the cache engine.
///
/// The engine never assumes atomicity beyond the individual operation and
/// never retries; failures propagate verbatim to the caller.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetches the raw value stored under `physical_key`, if any.
    async fn get(&self, physical_key: &str) -> Result<Option<String>>;

    /// Stores `raw_value` under `physical_key`, overwriting any prior value.
    async fn set(&self, physical_key: &str, raw_value: String) -> Result<()>;

    /// Removes the value stored under `physical_key`; absent keys are fine.
    async fn remove(&self, physical_key: &str) -> Result<()>;

    /// Lists every physical key currently stored.
    ///
    /// Used by `clear_all` and diagnostics; the engine filters by its own
    /// namespace prefix.
    async fn keys(&self) -> Result<Vec<String>>;
}

// == Sync Backend ==
/// Blocking variant of [`StorageBackend`] for media that complete in place.
pub trait SyncBackend: Send + Sync {
    /// Fetches the raw value stored under `physical_key`, if any.
    fn get(&self, physical_key: &str) -> Result<Option<String>>;

    /// Stores `raw_value` under `physical_key`, overwriting any prior value.
    fn set(&self, physical_key: &str, raw_value: String) -> Result<()>;

    /// Removes the value stored under `physical_key`; absent keys are fine.
    fn remove(&self, physical_key: &str) -> Result<()>;

    /// Lists every physical key currently stored.
    fn keys(&self) -> Result<Vec<String>>;
}

// == Sync Bridge ==
/// Lifts any [`SyncBackend`] into the asynchronous contract.
///
/// Operations resolve immediately; no executor hop is introduced.
#[derive(Debug, Default)]
pub struct SyncBridge<B> {
    inner: B,
}

impl<B: SyncBackend> SyncBridge<B> {
    /// Wraps a blocking backend.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: SyncBackend> StorageBackend for SyncBridge<B> {
    async fn get(&self, physical_key: &str) -> Result<Option<String>> {
        self.inner.get(physical_key)
    }

    async fn set(&self, physical_key: &str, raw_value: String) -> Result<()> {
        self.inner.set(physical_key, raw_value)
    }

    async fn remove(&self, physical_key: &str) -> Result<()> {
        self.inner.remove(physical_key)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }
}
