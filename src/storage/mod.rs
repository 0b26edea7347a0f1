//! Storage Module
//!
//! The cache engine: circular slot allocation, key grouping, lazy TTL
//! expiration, and refresh coalescing over a pluggable backend.

mod engine;
mod expiry;
mod index;
mod refresh;
mod ring;
mod sync;


// Re-export public types
pub use engine::Storage;
pub use expiry::{Clock, ExpirationPolicy, Expiry, SystemClock};
pub use index::KeyIndex;
pub use refresh::{RefreshCoordinator, RefreshFuture};
pub use ring::{Allocation, Identity, SlotEntry, SlotRing};
pub use sync::{sync_fn, SyncFn, SyncRegistry, SyncRequest};
