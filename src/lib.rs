//! Ring Cache - a fixed-capacity, time-aware key-value cache
//!
//! Sits in front of a pluggable persistent backend. Callers save arbitrary
//! structured values under a key plus an optional id, retrieve them later,
//! and get either the cached value, a not-found error, or an expired error -
//! unless a caller-supplied refresh function can repopulate the entry on the
//! spot. Capacity is bounded by a circular slot ring with strict FIFO
//! eviction by write order.
//!
//! # Example
//! ```
//! use ring_cache::{Storage, StorageConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ring_cache::Result<()> {
//! let storage = Storage::new(StorageConfig::new(16));
//!
//! storage.save("users", Some("1"), &"ada", None).await?;
//! let name: String = storage.load("users", Some("1")).await?;
//! assert_eq!(name, "ada");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod storage;

pub use backend::{MemoryBackend, StorageBackend, SyncBackend, SyncBridge};
pub use config::StorageConfig;
pub use error::{Result, StorageError};
pub use storage::{sync_fn, Clock, Expiry, Identity, Storage, SyncFn, SyncRequest, SystemClock};
