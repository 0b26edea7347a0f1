//! Configuration Module
//!
//! Construction-time configuration for a cache instance.

use std::env;
use std::fmt;
use std::sync::Arc;

use crate::backend::{StorageBackend, SyncBackend, SyncBridge};
use crate::storage::{Clock, SyncFn, SyncRegistry};

// == Defaults ==
/// Default slot count when none is configured
pub const DEFAULT_SIZE: usize = 1000;

/// Default TTL in milliseconds (one day), mirroring common session caches
pub const DEFAULT_EXPIRES_MS: u64 = 1000 * 3600 * 24;

// == Storage Config ==
/// Configuration consumed by [`Storage::new`](crate::Storage::new).
///
/// `size` is the only required knob; everything else has a default. Setters
/// consume and return `self` so configs read as a chain.
pub struct StorageConfig {
    /// Fixed slot count N; never resized after construction
    pub size: usize,
    /// Default TTL in milliseconds for saves without an explicit expiry;
    /// None = such entries never expire
    pub default_expires_ms: Option<u64>,
    /// Namespace prefixed onto every physical key, so multiple caches can
    /// share one backend
    pub namespace: String,
    pub(crate) backend: Option<Arc<dyn StorageBackend>>,
    pub(crate) sync: SyncRegistry,
    pub(crate) clock: Option<Arc<dyn Clock>>,
}

impl StorageConfig {
    // == Constructor ==
    /// Creates a config for a ring of `size` slots with default TTL and an
    /// in-memory backend.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            default_expires_ms: Some(DEFAULT_EXPIRES_MS),
            namespace: "ring-cache".to_string(),
            backend: None,
            sync: SyncRegistry::new(),
            clock: None,
        }
    }

    // == From Env ==
    /// Creates a config from environment variables.
    ///
    /// # Environment Variables
    /// - `RING_SIZE` - slot count (default: 1000)
    /// - `DEFAULT_EXPIRES_MS` - default TTL in milliseconds (default: 86400000)
    pub fn from_env() -> Self {
        let size = env::var("RING_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SIZE);
        let default_expires_ms = env::var("DEFAULT_EXPIRES_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_EXPIRES_MS);

        Self::new(size).default_expires_ms(default_expires_ms)
    }

    // == Default Expires ==
    /// Sets the default TTL applied to saves without an explicit expiry.
    pub fn default_expires_ms(mut self, ms: u64) -> Self {
        self.default_expires_ms = Some(ms);
        self
    }

    /// Makes saves without an explicit expiry never expire.
    pub fn never_expires(mut self) -> Self {
        self.default_expires_ms = None;
        self
    }

    // == Namespace ==
    /// Sets the physical-key namespace prefix.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    // == Backend ==
    /// Sets an asynchronous storage backend.
    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets a blocking storage backend, lifted through [`SyncBridge`].
    pub fn sync_backend<B: SyncBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(SyncBridge::new(backend)));
        self
    }

    // == Sync Functions ==
    /// Registers the global fallback refresh function.
    pub fn global_sync(mut self, f: SyncFn) -> Self {
        self.sync.set_global(f);
        self
    }

    /// Registers a refresh function for every id under `key`.
    pub fn sync_for_key(mut self, key: impl Into<String>, f: SyncFn) -> Self {
        self.sync.set_for_key(key, f);
        self
    }

    /// Registers a refresh function for one exact (key, id) pair.
    pub fn sync_for_id(mut self, key: impl Into<String>, id: Option<&str>, f: SyncFn) -> Self {
        self.sync.set_for_id(key, id, f);
        self
    }

    // == Clock ==
    /// Overrides the time source; tests use this to drive expiry manually.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("size", &self.size)
            .field("default_expires_ms", &self.default_expires_ms)
            .field("namespace", &self.namespace)
            .field("backend", &self.backend.is_some())
            .field("sync", &self.sync)
            .finish()
    }
}
