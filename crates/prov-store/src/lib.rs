//! Key-value storage for the provenance ledger.
//!
//! The ledger sees storage as a flat map from string keys to byte values.
//! This crate provides that map and the typed layer on top of it.
//!
//! # Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileKvStore`] -- single JSON document on disk, replaced atomically
//!
//! # Requests
//!
//! A [`SerialStore`] wraps a backend and hands out [`Transaction`]s. A
//! transaction holds the store's write lock, buffers every put, and commits
//! them with one [`KvStore::put_batch`]. Dropping it without committing
//! discards the buffer.
//!
//! # Typed records
//!
//! [`EntityStore`] persists primary records inside a revisioned
//! [`Envelope`] and keeps "absent" distinct from "present but undecodable".

pub mod codec;
pub mod entity;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;
pub mod transaction;

pub use codec::{decode, encode};
pub use entity::{EntityStore, Envelope, RECORD_REVISION};
pub use error::{StoreError, StoreResult};
pub use file::FileKvStore;
pub use memory::InMemoryKvStore;
pub use traits::{KvStore, KvView};
pub use transaction::{SerialStore, Transaction};
