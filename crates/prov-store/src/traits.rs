use crate::error::StoreResult;

/// Flat key-value store.
///
/// Implementations must satisfy these invariants:
/// - `get` distinguishes an absent key (`Ok(None)`) from a backend failure.
/// - `put` is an unconditional overwrite of one key.
/// - `put_batch` applies all writes or none of them.
/// - The store never interprets values.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Apply several writes as one unit.
    ///
    /// The default implementation is only atomic if `put` cannot fail
    /// part-way; backends with real failure modes override it.
    fn put_batch(&self, writes: &[(String, Vec<u8>)]) -> StoreResult<()> {
        writes.iter().try_for_each(|(key, value)| self.put(key, value))
    }
}

/// Request-scoped view of the store used by the typed layers.
///
/// Reads observe the view's own earlier writes.
pub trait KvView {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;
}
