use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{KvStore, KvView};

/// A backend plus the write lock that serializes requests against it.
///
/// At most one [`Transaction`] exists at a time, so every request runs
/// against a consistent view and read-modify-write sequences on registries
/// and chains cannot interleave.
pub struct SerialStore {
    backend: Arc<dyn KvStore>,
    write_lock: Mutex<()>,
}

impl SerialStore {
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &Arc<dyn KvStore> {
        &self.backend
    }

    /// Begin a request. Blocks until any running request has finished.
    pub fn transaction(&self) -> StoreResult<Transaction<'_>> {
        let guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(Transaction {
            backend: self.backend.as_ref(),
            _guard: guard,
            pending: BTreeMap::new(),
        })
    }
}

impl std::fmt::Debug for SerialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStore").finish_non_exhaustive()
    }
}

/// Buffered writes of one request.
///
/// Reads see pending writes first, then the backend. Nothing reaches the
/// backend until [`commit`](Self::commit); dropping the transaction discards
/// every pending write.
pub struct Transaction<'a> {
    backend: &'a dyn KvStore,
    _guard: MutexGuard<'a, ()>,
    pending: BTreeMap<String, Vec<u8>>,
}

impl Transaction<'_> {
    /// Flush all pending writes as one batch. Returns the number of keys written.
    pub fn commit(self) -> StoreResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let writes: Vec<(String, Vec<u8>)> = self.pending.into_iter().collect();
        self.backend.put_batch(&writes)?;
        debug!(keys = writes.len(), "transaction committed");
        Ok(writes.len())
    }
}

impl KvView for Transaction<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.backend.get(key),
        }
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.pending.insert(key.to_string(), value);
        Ok(())
    }
}
