//! Refresh Coordinator Module
//!
//! Deduplicates concurrent refreshes for the same identity into one in-flight
//! execution whose outcome fans out to every waiter.
//!
//! The first caller for an identity installs a [`Shared`] future and drives
//! it; concurrent callers for the same identity clone that future and await
//! it, so the underlying refresh function runs exactly once. Refreshes for
//! distinct identities never wait on each other.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::storage::ring::Identity;

/// Shared future for one in-flight refresh.
///
/// Both `Value` and the error enum are `Clone`, which [`Shared`] requires to
/// hand the same outcome to every waiter.
pub type RefreshFuture = Shared<BoxFuture<'static, Result<Value>>>;

// == Refresh Coordinator ==
/// Per-identity in-flight refresh table.
#[derive(Default)]
pub struct RefreshCoordinator {
    /// Identities with a refresh currently in flight.
    ///
    /// The lock is only held for map lookups and insertions, never across an
    /// await.
    in_flight: Mutex<HashMap<Identity, RefreshFuture>>,
}

impl RefreshCoordinator {
    // == Constructor ==
    /// Creates a coordinator with no in-flight refreshes.
    pub fn new() -> Self {
        Self::default()
    }

    // == Join Or Start ==
    /// Returns the in-flight refresh for `identity`, installing `start`'s
    /// future if none exists.
    ///
    /// A resolved future still present in the table was left behind by a
    /// caller cancelled before it could finalize; it is discarded and a fresh
    /// refresh starts in its place.
    pub fn join_or_start<F>(&self, identity: &Identity, start: F) -> RefreshFuture
    where
        F: FnOnce() -> BoxFuture<'static, Result<Value>>,
    {
        let mut in_flight = self
            .in_flight
            .lock()
            .expect("refresh coordinator lock poisoned");

        if let Some(existing) = in_flight.get(identity) {
            if existing.peek().is_none() {
                debug!(identity = %identity, "joining in-flight refresh");
                return existing.clone();
            }
        }

        debug!(identity = %identity, "starting refresh");
        let fut = start().shared();
        in_flight.insert(identity.clone(), fut.clone());
        fut
    }

    // == Finish ==
    /// Removes `identity` from the in-flight table.
    ///
    /// Called by the refresh future itself once its outcome is decided, so a
    /// later load triggers a new independent refresh.
    pub fn finish(&self, identity: &Identity) {
        self.in_flight
            .lock()
            .expect("refresh coordinator lock poisoned")
            .remove(identity);
    }

    // == In Flight ==
    /// Returns the number of refreshes currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .expect("refresh coordinator lock poisoned")
            .len()
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}
