use prov_types::EntityKind;

/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is absent or holds a zero-length value.
    ///
    /// Internal signal: callers treat it as "empty" rather than surfacing it.
    #[error("key absent: {0}")]
    Absent(String),

    /// The key holds a value that cannot be decoded.
    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Creation attempted on a key that already holds a record.
    #[error("key already occupied: {0}")]
    Conflict(String),

    /// The record under the key belongs to another entity kind.
    #[error("record {key} is a {found}, expected a {expected}")]
    KindMismatch {
        key: String,
        expected: EntityKind,
        found: EntityKind,
    },

    /// Serialization failure while encoding a value.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
