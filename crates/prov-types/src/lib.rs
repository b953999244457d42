//! Foundation types for the provenance ledger.
//!
//! Every other `prov-*` crate depends on this one. It holds the vocabulary of
//! the chain-of-custody model and nothing that touches storage.
//!
//! # Key Types
//!
//! - [`RoleKind`]: closed set of actor roles
//! - [`Actor`]: the calling party of a request (name + role)
//! - [`EntityKind`]: tracked entity kinds, their chain prefixes and registries
//! - [`ChainKey`]: derived header-chain key (`<prefix>-<tag>`)
//! - [`TrackedAnimal`], [`ProcessedGood`], [`PackagedGood`], [`Batch`]: primary records
//! - [`ChainEvent`] / [`EventType`]: header chain entries
//! - [`TransferRecord`]: custody transfer entry in a party's transfer log
//! - [`RequestId`]: UUID v7 identifier for one logical request

pub mod entity;
pub mod error;
pub mod event;
pub mod records;
pub mod request;
pub mod role;

pub use entity::{reserved_form, ChainKey, EntityKind};
pub use error::TypeError;
pub use event::{ChainEvent, EventType, TransferRecord, TRANSFER_LOG_PREFIX};
pub use records::{Batch, Entity, PackagedGood, ProcessedGood, TrackedAnimal};
pub use request::RequestId;
pub use role::{Actor, RoleKind};
