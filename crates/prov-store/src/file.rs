use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

const DOCUMENT_VERSION: u32 = 1;

/// On-disk layout: one JSON document holding every entry.
#[derive(Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// File-backed key-value store.
///
/// The whole map lives in memory and is written to a single JSON document on
/// every write. Writes go to a temporary file in the same directory which is
/// then renamed over the document, so a batch is either fully on disk or not
/// at all. Values must be UTF-8.
pub struct FileKvStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl FileKvStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read(&path)?;
            let doc: StoreDocument =
                serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
                    key: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            if doc.version != DOCUMENT_VERSION {
                return Err(StoreError::Corrupt {
                    key: path.display().to_string(),
                    reason: format!("unsupported document version {}", doc.version),
                });
            }
            doc.entries
                .into_iter()
                .map(|(k, v)| (k, v.into_bytes()))
                .collect()
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "file store opened");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, map: &BTreeMap<String, Vec<u8>>) -> StoreResult<()> {
        let mut entries = BTreeMap::new();
        for (key, value) in map {
            let text = String::from_utf8(value.clone()).map_err(|_| {
                StoreError::Serialization(format!("value for {key} is not UTF-8"))
            })?;
            entries.insert(key.clone(), text);
        }
        let doc = StoreDocument {
            version: DOCUMENT_VERSION,
            entries,
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.put_batch(&[(key.to_string(), value.to_vec())])
    }

    fn put_batch(&self, writes: &[(String, Vec<u8>)]) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let mut next = map.clone();
        for (key, value) in writes {
            next.insert(key.clone(), value.clone());
        }
        self.persist(&next)?;
        *map = next;
        debug!(path = %self.path.display(), writes = writes.len(), "file store committed");
        Ok(())
    }
}

impl std::fmt::Debug for FileKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKvStore")
            .field("path", &self.path)
            .finish()
    }
}
