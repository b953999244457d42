//! Append-only structures for the provenance ledger.
//!
//! This crate owns every list that only ever grows:
//! - [`Registry`] -- ordered, duplicate-free membership list under a well-known key
//! - [`HeaderChainEngine`] -- per-entity event log keyed by a derived [`ChainKey`](prov_types::ChainKey)
//! - [`TransferLog`] -- per-party log of custody transfers
//!
//! All three read the current list (absent means empty), append, and write the
//! list back through the caller's [`KvView`](prov_store::KvView). Nothing here
//! removes or reorders an element.

pub mod digest;
pub mod error;
pub mod header;
mod list;
pub mod registry;
pub mod transfer_log;

pub use digest::EventDigest;
pub use error::{ChainError, ChainResult};
pub use header::{ChainReport, HeaderChainEngine, SealedEvent, Violation, ViolationKind};
pub use registry::Registry;
pub use transfer_log::TransferLog;
