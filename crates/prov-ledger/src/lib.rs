//! Provenance ledger over a key-value store.
//!
//! The [`Ledger`] implements the chain-of-custody model: role-gated creation
//! of animals, processed goods, packaged goods and batches; cross-entity
//! propagation of linking events into upstream chains; symmetric custody
//! transfers; and read queries over registries and chains. Each operation is
//! one all-or-nothing transaction.
//!
//! Requests arrive either as typed calls on [`Ledger`], as named commands via
//! the [`CommandRegistry`], or through the single-writer [`LedgerService`].
//!
//! ```rust
//! use prov_ledger::{CommandRegistry, Ledger};
//! use prov_types::{Actor, RoleKind};
//!
//! let ledger = Ledger::in_memory();
//! let commands = CommandRegistry::standard().unwrap();
//! let farmer = Actor::new("FarmerA", RoleKind::Farmer);
//! let args: Vec<String> = [
//!     "bovine", "angus", "A1", "T01", "2024-01-01", "410", "FarmerA", "alive",
//!     "1", "", "", "organic",
//! ]
//! .iter()
//! .map(|s| s.to_string())
//! .collect();
//! commands.dispatch(&ledger, Some(&farmer), "createAnimal", &args).unwrap();
//! assert_eq!(ledger.get_chain("T01").unwrap().len(), 1);
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod ledger;
pub mod requests;
pub mod service;

pub use commands::{BoundArgs, CommandRegistry, CommandSpec, RegistryError};
pub use config::{ConfigError, LedgerConfig};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Created, Ledger};
pub use requests::{
    parse_tag_list, CreateAnimal, CreateBatch, CreatePackagedGood, CreateProcessedGood,
    TransferItem,
};
pub use service::{LedgerHandle, LedgerService};
