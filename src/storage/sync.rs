//! Sync Registry Module
//!
//! Holds caller-supplied refresh ("sync") functions and resolves the one to
//! run for a given identity. Resolution is an explicit specificity table:
//! per-(key, id) beats per-key, which beats the global fallback.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StorageError};
use crate::storage::ring::Identity;

// == Sync Request ==
/// Arguments handed to a refresh function on miss or expiry.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Key of the entry being refreshed
    pub key: String,
    /// Optional id of the entry being refreshed
    pub id: Option<String>,
}

// == Sync Fn ==
/// A caller-supplied refresh function.
///
/// Produces the replacement payload as a JSON value; errors propagate
/// verbatim to every caller waiting on the refresh.
pub type SyncFn = Arc<dyn Fn(SyncRequest) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

// == Sync Fn Helper ==
/// Wraps an async closure returning any serializable value into a [`SyncFn`].
pub fn sync_fn<F, Fut, T>(f: F) -> SyncFn
where
    F: Fn(SyncRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Serialize,
{
    Arc::new(move |request| {
        let fut = f(request);
        async move {
            let value = fut.await?;
            serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
        }
        .boxed()
    })
}

// == Sync Registry ==
/// Refresh functions registered globally, per key, or per (key, id).
#[derive(Default, Clone)]
pub struct SyncRegistry {
    /// Fallback used when nothing more specific matches
    global: Option<SyncFn>,
    /// Per-key refresh functions
    by_key: HashMap<String, SyncFn>,
    /// Per-(key, id) refresh functions
    by_identity: HashMap<Identity, SyncFn>,
}

impl SyncRegistry {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Set Global ==
    /// Registers the global fallback refresh function.
    pub fn set_global(&mut self, f: SyncFn) {
        self.global = Some(f);
    }

    // == Set For Key ==
    /// Registers a refresh function for every id under `key`.
    pub fn set_for_key(&mut self, key: impl Into<String>, f: SyncFn) {
        self.by_key.insert(key.into(), f);
    }

    // == Set For Id ==
    /// Registers a refresh function for one exact (key, id) pair.
    pub fn set_for_id(&mut self, key: impl Into<String>, id: Option<&str>, f: SyncFn) {
        self.by_identity.insert(Identity::new(key, id), f);
    }

    // == Resolve ==
    /// Picks the refresh function for `identity`, most specific first.
    pub fn resolve(&self, identity: &Identity) -> Option<SyncFn> {
        self.by_identity
            .get(identity)
            .or_else(|| self.by_key.get(&identity.key))
            .or(self.global.as_ref())
            .cloned()
    }

    // == Is Empty ==
    /// Returns true if no refresh function is registered at any level.
    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.by_key.is_empty() && self.by_identity.is_empty()
    }
}

impl fmt::Debug for SyncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRegistry")
            .field("global", &self.global.is_some())
            .field("by_key", &self.by_key.len())
            .field("by_identity", &self.by_identity.len())
            .finish()
    }
}
