//! Command registry: name -> declared parameters, required role, handler.
//!
//! The registry is validated once at construction. Dispatch checks the
//! declared role, binds positional arguments to parameter names with an
//! exact arity check, and hands the bound arguments to the handler, which
//! builds a named request record for the [`Ledger`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use prov_types::{Actor, EntityKind, RoleKind};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::requests::{
    parse_tag_list, CreateAnimal, CreateBatch, CreatePackagedGood, CreateProcessedGood,
    TransferItem,
};

type Handler = fn(&Ledger, Option<&Actor>, &BoundArgs<'_>) -> LedgerResult<Value>;

/// Errors found while validating a command table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("command {0} is registered twice")]
    DuplicateCommand(&'static str),

    #[error("command {0} declares an empty parameter name")]
    EmptyParameter(&'static str),

    #[error("command {command} declares parameter {param} twice")]
    DuplicateParameter {
        command: &'static str,
        param: &'static str,
    },

    #[error("command {command} creates {kind} and must require {required:?}, not {declared:?}")]
    RoleMismatch {
        command: &'static str,
        kind: EntityKind,
        declared: Option<RoleKind>,
        required: Option<RoleKind>,
    },
}

/// One entry of the command table.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub params: &'static [&'static str],
    /// Role the caller must hold, checked before arguments are parsed.
    pub role: Option<RoleKind>,
    /// Entity kind the command creates, if any.
    pub creates: Option<EntityKind>,
    /// Whether the command needs a caller identity.
    pub requires_caller: bool,
    /// Whether the command writes to the store.
    pub mutates: bool,
    handler: Handler,
}

impl CommandSpec {
    /// A read-only command open to anonymous callers.
    pub fn query(name: &'static str, params: &'static [&'static str], handler: Handler) -> Self {
        Self {
            name,
            params,
            role: None,
            creates: None,
            requires_caller: false,
            mutates: false,
            handler,
        }
    }

    /// A writing command that needs no caller, such as store setup.
    pub fn maintenance(
        name: &'static str,
        params: &'static [&'static str],
        handler: Handler,
    ) -> Self {
        Self {
            mutates: true,
            ..Self::query(name, params, handler)
        }
    }

    /// A command that acts on behalf of a caller.
    pub fn invoke(name: &'static str, params: &'static [&'static str], handler: Handler) -> Self {
        Self {
            name,
            params,
            role: None,
            creates: None,
            requires_caller: true,
            mutates: true,
            handler,
        }
    }

    /// Mark the command as creating `kind`, gated on `role`.
    pub fn creating(mut self, kind: EntityKind, role: Option<RoleKind>) -> Self {
        self.creates = Some(kind);
        self.role = role;
        self
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for param in self.params {
            if param.trim().is_empty() {
                return Err(RegistryError::EmptyParameter(self.name));
            }
            if !seen.insert(*param) {
                return Err(RegistryError::DuplicateParameter {
                    command: self.name,
                    param: *param,
                });
            }
        }
        if let Some(kind) = self.creates {
            if self.role != kind.required_role() {
                return Err(RegistryError::RoleMismatch {
                    command: self.name,
                    kind,
                    declared: self.role,
                    required: kind.required_role(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("role", &self.role)
            .field("creates", &self.creates)
            .field("requires_caller", &self.requires_caller)
            .field("mutates", &self.mutates)
            .finish_non_exhaustive()
    }
}

/// Positional arguments bound to declared parameter names.
#[derive(Debug)]
pub struct BoundArgs<'a> {
    command: &'static str,
    values: HashMap<&'static str, &'a str>,
}

impl BoundArgs<'_> {
    fn raw(&self, name: &str) -> LedgerResult<&str> {
        self.values.get(name).copied().ok_or_else(|| {
            LedgerError::validation(format!("{} has no parameter {name}", self.command))
        })
    }

    pub fn text(&self, name: &str) -> LedgerResult<String> {
        self.raw(name).map(str::to_string)
    }

    /// Finite decimal number.
    pub fn number(&self, name: &str) -> LedgerResult<f64> {
        let raw = self.raw(name)?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| {
                LedgerError::validation(format!(
                    "{}: {name} must be a number, got {raw:?}",
                    self.command
                ))
            })
    }

    pub fn kind(&self, name: &str) -> LedgerResult<EntityKind> {
        Ok(self.raw(name)?.parse()?)
    }
}

/// The validated command table.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    pub fn new(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, RegistryError> {
        let mut commands = BTreeMap::new();
        for spec in specs {
            spec.validate()?;
            if commands.insert(spec.name, spec).is_some() {
                return Err(RegistryError::DuplicateCommand(spec.name));
            }
        }
        Ok(Self { commands })
    }

    /// The full ledger command surface.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(standard_commands())
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run `name` with positional `args` on behalf of `actor`.
    pub fn dispatch(
        &self,
        ledger: &Ledger,
        actor: Option<&Actor>,
        name: &str,
        args: &[String],
    ) -> LedgerResult<Value> {
        let spec = self
            .commands
            .get(name)
            .ok_or_else(|| LedgerError::validation(format!("unknown command {name}")))?;

        if spec.requires_caller && actor.is_none() {
            return Err(LedgerError::Permission(format!(
                "{name} requires a caller identity"
            )));
        }
        if let Some(role) = spec.role {
            ledger.guard().require_role(caller(actor)?, role)?;
        }
        if args.len() != spec.params.len() {
            return Err(LedgerError::validation(format!(
                "{name} expects {} arguments ({}), got {}",
                spec.params.len(),
                spec.params.join(", "),
                args.len()
            )));
        }

        let bound = BoundArgs {
            command: spec.name,
            values: spec
                .params
                .iter()
                .copied()
                .zip(args.iter().map(String::as_str))
                .collect(),
        };
        (spec.handler)(ledger, actor, &bound)
    }
}

// ---------------------------------------------------------------------------
// Command table
// ---------------------------------------------------------------------------

const CREATE_ANIMAL: &[&str] = &[
    "species",
    "type",
    "id",
    "tag",
    "birthdate",
    "weight",
    "custodianId",
    "status",
    "block",
    "value",
    "linkReference",
    "certificate",
];

const CREATE_PROCESSED_GOOD: &[&str] = &[
    "id",
    "weight",
    "createdDate",
    "sourceTag",
    "expireDate",
    "temperature",
    "companyId",
    "certificate",
    "block",
    "linkReference",
];

const CREATE_PACKAGED_GOOD: &[&str] = &[
    "id",
    "weight",
    "createdDate",
    "sourceTag",
    "expireDate",
    "temperature",
    "companyId",
    "preservationProcess",
    "certificate",
    "packageType",
    "productState",
    "cutName",
    "block",
    "value",
    "linkReference",
    "sourceChainKey",
];

const CREATE_BATCH: &[&str] = &[
    "custodianId",
    "batchId",
    "tagList",
    "date",
    "sourceChainKey",
    "block",
];

const TRANSFER_ITEM: &[&str] = &[
    "itemId",
    "itemValue",
    "description",
    "fromParty",
    "toParty",
    "date",
];

fn standard_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::invoke("createAnimal", CREATE_ANIMAL, create_animal)
            .creating(EntityKind::Animal, Some(RoleKind::Farmer)),
        CommandSpec::invoke("createProcessedGood", CREATE_PROCESSED_GOOD, create_processed_good)
            .creating(EntityKind::ProcessedGood, Some(RoleKind::Slaughterhouse)),
        CommandSpec::invoke("createPackagedGood", CREATE_PACKAGED_GOOD, create_packaged_good)
            .creating(EntityKind::PackagedGood, Some(RoleKind::Manufacturer)),
        CommandSpec::invoke("createBatch", CREATE_BATCH, create_batch)
            .creating(EntityKind::Batch, None),
        CommandSpec::invoke("transferItem", TRANSFER_ITEM, transfer_item),
        CommandSpec::maintenance("init", &[], init),
        CommandSpec::query("getItem", &["key"], get_item),
        CommandSpec::query("getAllOfKind", &["kind"], get_all_of_kind),
        CommandSpec::query("getChain", &["tag"], get_chain),
        CommandSpec::query("getCustodianList", &["custodianId", "kind"], get_custodian_list),
        CommandSpec::query("getTransfers", &["party"], get_transfers),
        CommandSpec::query("verifyChain", &["tag"], verify_chain),
        CommandSpec::query("read", &["key"], read),
    ]
}

fn caller(actor: Option<&Actor>) -> LedgerResult<&Actor> {
    actor.ok_or_else(|| LedgerError::Permission("no caller identity".into()))
}

fn to_value<T: Serialize>(value: T) -> LedgerResult<Value> {
    serde_json::to_value(value).map_err(|e| LedgerError::Store(e.to_string()))
}

fn create_animal(ledger: &Ledger, actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    let req = CreateAnimal {
        species: args.text("species")?,
        animal_type: args.text("type")?,
        id: args.text("id")?,
        tag: args.text("tag")?,
        birthdate: args.text("birthdate")?,
        weight: args.number("weight")?,
        custodian_id: args.text("custodianId")?,
        status: args.text("status")?,
        block: args.text("block")?,
        value: args.text("value")?,
        link_reference: args.text("linkReference")?,
        certificate: args.text("certificate")?,
    };
    to_value(ledger.create_animal(caller(actor)?, &req)?)
}

fn create_processed_good(
    ledger: &Ledger,
    actor: Option<&Actor>,
    args: &BoundArgs<'_>,
) -> LedgerResult<Value> {
    let req = CreateProcessedGood {
        id: args.text("id")?,
        weight: args.number("weight")?,
        created_date: args.text("createdDate")?,
        source_tag: args.text("sourceTag")?,
        expire_date: args.text("expireDate")?,
        temperature: args.number("temperature")?,
        company_id: args.text("companyId")?,
        certificate: args.text("certificate")?,
        block: args.text("block")?,
        link_reference: args.text("linkReference")?,
    };
    to_value(ledger.create_processed_good(caller(actor)?, &req)?)
}

fn create_packaged_good(
    ledger: &Ledger,
    actor: Option<&Actor>,
    args: &BoundArgs<'_>,
) -> LedgerResult<Value> {
    let req = CreatePackagedGood {
        id: args.text("id")?,
        weight: args.number("weight")?,
        created_date: args.text("createdDate")?,
        source_tag: args.text("sourceTag")?,
        expire_date: args.text("expireDate")?,
        temperature: args.number("temperature")?,
        company_id: args.text("companyId")?,
        preservation_process: args.text("preservationProcess")?,
        certificate: args.text("certificate")?,
        package_type: args.text("packageType")?,
        product_state: args.text("productState")?,
        cut_name: args.text("cutName")?,
        block: args.text("block")?,
        value: args.text("value")?,
        link_reference: args.text("linkReference")?,
        source_chain_key: args.text("sourceChainKey")?,
    };
    to_value(ledger.create_packaged_good(caller(actor)?, &req)?)
}

fn create_batch(ledger: &Ledger, actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    let req = CreateBatch {
        custodian_id: args.text("custodianId")?,
        batch_id: args.text("batchId")?,
        tags: parse_tag_list(&args.text("tagList")?)?,
        date: args.text("date")?,
        source_chain_key: args.text("sourceChainKey")?,
        block: args.text("block")?,
    };
    to_value(ledger.create_batch(caller(actor)?, &req)?)
}

fn transfer_item(ledger: &Ledger, actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    let req = TransferItem {
        item_id: args.text("itemId")?,
        item_value: args.text("itemValue")?,
        description: args.text("description")?,
        from: args.text("fromParty")?,
        to: args.text("toParty")?,
        date: args.text("date")?,
    };
    to_value(ledger.transfer_item(caller(actor)?, &req)?)
}

fn init(ledger: &Ledger, _actor: Option<&Actor>, _args: &BoundArgs<'_>) -> LedgerResult<Value> {
    to_value(ledger.init()?)
}

fn get_item(ledger: &Ledger, _actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    Ok(ledger.get_item(&args.text("key")?)?.record)
}

fn get_all_of_kind(ledger: &Ledger, _actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    to_value(ledger.get_all_of_kind(args.kind("kind")?)?)
}

fn get_chain(ledger: &Ledger, _actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    to_value(ledger.get_chain(&args.text("tag")?)?)
}

fn get_custodian_list(
    ledger: &Ledger,
    _actor: Option<&Actor>,
    args: &BoundArgs<'_>,
) -> LedgerResult<Value> {
    to_value(ledger.get_custodian_list(&args.text("custodianId")?, args.kind("kind")?)?)
}

fn get_transfers(ledger: &Ledger, _actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    to_value(ledger.get_transfers(&args.text("party")?)?)
}

fn verify_chain(ledger: &Ledger, _actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    to_value(ledger.verify_chain(&args.text("tag")?)?)
}

fn read(ledger: &Ledger, _actor: Option<&Actor>, args: &BoundArgs<'_>) -> LedgerResult<Value> {
    to_value(ledger.read_raw(&args.text("key")?)?)
}
