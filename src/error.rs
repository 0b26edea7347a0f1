//! Error types for the ring cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Storage Error Enum ==
/// Unified error type for all cache operations.
///
/// The enum is `Clone` so that a single refresh outcome can be fanned out
/// to every caller waiting on the same in-flight refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No resident entry for the identity and no refresh function configured,
    /// or an explicit `remove` of a nonexistent identity
    #[error("entry not found: key={key:?}, id={id:?}")]
    NotFound {
        /// Logical key of the missing entry
        key: String,
        /// Optional id of the missing entry
        id: Option<String>,
    },

    /// Entry is resident but its expiry has passed and no refresh function
    /// is configured
    #[error("entry expired: key={key:?}, id={id:?}")]
    Expired {
        /// Logical key of the expired entry
        key: String,
        /// Optional id of the expired entry
        id: Option<String>,
    },

    /// A caller-supplied refresh (sync) function failed; the message is
    /// carried verbatim
    #[error("sync failed: {0}")]
    Sync(String),

    /// The storage backend reported a failure; never retried by the engine
    #[error("backend error: {0}")]
    Backend(String),

    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, StorageError>;
