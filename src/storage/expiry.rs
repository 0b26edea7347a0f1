//! Expiration Policy Module
//!
//! Computes and checks entry expiry against a pluggable clock.
//!
//! Expiration is lazy: it is checked only when an entry is loaded, never by a
//! background sweep. Expired slots stay physically resident and occupy ring
//! capacity until the cursor wraps onto them or they are removed explicitly.

use std::time::{SystemTime, UNIX_EPOCH};

// == Clock ==
/// Source of the current time in Unix milliseconds.
///
/// Abstracted so tests can drive a manual clock instead of sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current Unix timestamp in milliseconds.
    fn now_ms(&self) -> u64;
}

// == System Clock ==
/// Default clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }
}

// == Expiry ==
/// Per-save expiry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never expires
    Never,
    /// The entry expires this many milliseconds after the save
    AfterMs(u64),
}

// == Expiration Policy ==
/// Turns explicit or default TTLs into absolute expiry timestamps.
#[derive(Debug, Clone, Copy)]
pub struct ExpirationPolicy {
    /// Default TTL in milliseconds applied when a save names no expiry;
    /// None = entries without an explicit expiry never expire
    default_expires_ms: Option<u64>,
}

impl ExpirationPolicy {
    // == Constructor ==
    /// Creates a policy with the given default TTL (None = never).
    pub fn new(default_expires_ms: Option<u64>) -> Self {
        Self { default_expires_ms }
    }

    // == Compute Expiry ==
    /// Resolves a save's expiry request into an absolute timestamp.
    ///
    /// An explicit request wins over the default; `None` means the save
    /// named nothing and the configured default applies.
    pub fn compute_expires_at(&self, explicit: Option<Expiry>, now_ms: u64) -> Option<u64> {
        let ttl = match explicit {
            Some(Expiry::Never) => None,
            Some(Expiry::AfterMs(ms)) => Some(ms),
            None => self.default_expires_ms,
        };
        // Saturate so an absurd TTL degrades to effectively-never instead of
        // overflowing
        ttl.map(|ms| now_ms.saturating_add(ms))
    }

    // == Is Expired ==
    /// Checks whether an absolute expiry has passed.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration time.
    pub fn is_expired(&self, expires_at: Option<u64>, now_ms: u64) -> bool {
        match expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }
}
