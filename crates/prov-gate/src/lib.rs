//! Permission gate for the provenance ledger.
//!
//! Every mutating request passes through the [`PermissionGuard`] before its
//! first write. Creation of animals, processed goods and packaged goods is
//! reserved for one role each; transfers are governed by a configurable
//! [`TransferPolicy`]. The caller itself comes from an [`IdentityProvider`].
//!
//! ```rust
//! use prov_gate::PermissionGuard;
//! use prov_types::{Actor, EntityKind, RoleKind};
//!
//! let guard = PermissionGuard::default();
//! let farmer = Actor::new("FarmerA", RoleKind::Farmer);
//! assert!(guard.require_for(&farmer, EntityKind::Animal).is_ok());
//! assert!(guard.require_for(&farmer, EntityKind::PackagedGood).is_err());
//! ```

pub mod error;
pub mod guard;
pub mod identity;
pub mod policy;

pub use error::{GateError, GateResult};
pub use guard::PermissionGuard;
pub use identity::{AttributeIdentity, IdentityProvider, StaticIdentity};
pub use policy::TransferPolicy;
