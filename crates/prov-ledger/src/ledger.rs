use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, Span};

use prov_chain::{ChainReport, HeaderChainEngine, Registry, TransferLog};
use prov_gate::PermissionGuard;
use prov_store::{EntityStore, Envelope, InMemoryKvStore, KvStore, KvView, SerialStore, Transaction};
use prov_types::{
    Actor, ChainEvent, ChainKey, Entity, EntityKind, EventType, ProcessedGood, TransferRecord,
};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::requests::{CreateAnimal, CreateBatch, CreatePackagedGood, CreateProcessedGood, TransferItem};

/// Keys written by a successful creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub kind: EntityKind,
    pub key: String,
    pub chain_key: ChainKey,
    /// Upstream chains that received a linking event, in write order.
    pub linked: Vec<ChainKey>,
}

/// The provenance ledger.
///
/// Every operation runs inside one [`Transaction`]: checks first, then
/// buffered writes, then a single commit. A failed operation leaves the
/// backend untouched.
pub struct Ledger {
    store: SerialStore,
    entities: EntityStore,
    registry: Registry,
    chains: HeaderChainEngine,
    transfers: TransferLog,
    guard: PermissionGuard,
    config: LedgerConfig,
    span: Span,
}

impl Ledger {
    pub fn new(backend: Arc<dyn KvStore>, config: LedgerConfig, span: Span) -> Self {
        Self {
            store: SerialStore::new(backend),
            entities: EntityStore::new(span.clone()),
            registry: Registry::new(span.clone()),
            chains: HeaderChainEngine::new(span.clone(), config.seal_chains),
            transfers: TransferLog::new(span.clone()),
            guard: PermissionGuard::new(span.clone(), config.transfer_policy),
            config,
            span,
        }
    }

    /// A ledger over a fresh in-memory store with default configuration.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryKvStore::new()),
            LedgerConfig::default(),
            Span::none(),
        )
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn guard(&self) -> &PermissionGuard {
        &self.guard
    }

    pub fn backend(&self) -> &Arc<dyn KvStore> {
        self.store.backend()
    }

    // ---- Creation ----

    pub fn create_animal(&self, actor: &Actor, req: &CreateAnimal) -> LedgerResult<Created> {
        self.guard.require_for(actor, EntityKind::Animal)?;
        req.validate()?;

        let mut tx = self.store.transaction()?;
        self.entities.ensure_vacant(&tx, &req.tag)?;

        let record = req.record();
        let chain_key = record.chain_key();
        self.entities.create(&mut tx, &record)?;
        self.register(&mut tx, EntityKind::Animal, &record.tag, Some(&record.custodian_id))?;
        let value = non_empty_or(&req.value, &req.tag);
        self.chains.append_event(
            &mut tx,
            &chain_key,
            ChainEvent::new(&req.block, EventType::Create, value, &req.link_reference),
        )?;

        let writes = tx.commit()?;
        info!(parent: &self.span, actor = %actor, tag = %record.tag, writes, "animal created");
        Ok(Created {
            kind: EntityKind::Animal,
            key: record.tag,
            chain_key,
            linked: Vec::new(),
        })
    }

    pub fn create_processed_good(
        &self,
        actor: &Actor,
        req: &CreateProcessedGood,
    ) -> LedgerResult<Created> {
        self.guard.require_for(actor, EntityKind::ProcessedGood)?;
        req.validate()?;

        let mut tx = self.store.transaction()?;
        self.entities.ensure_vacant(&tx, &req.id)?;
        self.check_upstream(&tx, &req.source_tag, EntityKind::Animal)?;
        let upstream = EntityKind::Animal.chain_key(&req.source_tag);

        let record = req.record();
        let chain_key = record.chain_key();
        self.entities.create(&mut tx, &record)?;
        self.register(&mut tx, EntityKind::ProcessedGood, &record.id, None)?;
        self.chains.append_event(
            &mut tx,
            &chain_key,
            ChainEvent::new(&req.block, EventType::Create, &req.id, &req.link_reference),
        )?;
        self.chains.append_event(
            &mut tx,
            &upstream,
            ChainEvent::new(&req.block, EventType::Transform, &req.id, &req.link_reference),
        )?;

        let writes = tx.commit()?;
        info!(parent: &self.span, actor = %actor, id = %record.id, source = %upstream, writes, "processed good created");
        Ok(Created {
            kind: EntityKind::ProcessedGood,
            key: record.id,
            chain_key,
            linked: vec![upstream],
        })
    }

    pub fn create_packaged_good(
        &self,
        actor: &Actor,
        req: &CreatePackagedGood,
    ) -> LedgerResult<Created> {
        self.guard.require_for(actor, EntityKind::PackagedGood)?;
        req.validate()?;

        let mut tx = self.store.transaction()?;
        self.entities.ensure_vacant(&tx, &req.id)?;
        let source_chain = EntityKind::ProcessedGood.chain_key(&req.source_tag);
        let animal_chain = self.animal_chain_for_package(&tx, req)?;

        let record = req.record();
        let chain_key = record.chain_key();
        self.entities.create(&mut tx, &record)?;
        self.register(&mut tx, EntityKind::PackagedGood, &record.id, None)?;
        let value = non_empty_or(&req.value, &req.id);
        self.chains.append_event(
            &mut tx,
            &chain_key,
            ChainEvent::new(&req.block, EventType::Create, value, &req.link_reference),
        )?;
        for upstream in [&source_chain, &animal_chain] {
            self.chains.append_event(
                &mut tx,
                upstream,
                ChainEvent::new(&req.block, EventType::Package, &req.id, &req.link_reference),
            )?;
        }

        let writes = tx.commit()?;
        info!(parent: &self.span, actor = %actor, id = %record.id, source = %source_chain, animal = %animal_chain, writes, "packaged good created");
        Ok(Created {
            kind: EntityKind::PackagedGood,
            key: record.id,
            chain_key,
            linked: vec![source_chain, animal_chain],
        })
    }

    pub fn create_batch(&self, actor: &Actor, req: &CreateBatch) -> LedgerResult<Created> {
        self.guard.require_for(actor, EntityKind::Batch)?;
        req.validate()?;

        let mut tx = self.store.transaction()?;
        self.entities.ensure_vacant(&tx, &req.batch_id)?;
        let mut members = Vec::with_capacity(req.tags.len());
        for tag in &req.tags {
            match self.entities.kind_of(&tx, tag)? {
                Some(EntityKind::Batch) => {
                    return Err(LedgerError::validation(format!(
                        "{tag} is a batch and cannot be a batch member"
                    )))
                }
                Some(kind) => members.push(kind.chain_key(tag)),
                None => return Err(LedgerError::validation(format!("unknown item {tag}"))),
            }
        }

        let record = req.record();
        let chain_key = record.chain_key.clone();
        self.entities.create(&mut tx, &record)?;
        self.register(&mut tx, EntityKind::Batch, &record.batch_id, Some(&record.custodian_id))?;
        self.chains.append_event(
            &mut tx,
            &chain_key,
            ChainEvent::new(&req.block, EventType::Create, &req.batch_id, &req.source_chain_key),
        )?;
        for member in &members {
            self.chains.append_event(
                &mut tx,
                member,
                ChainEvent::new(&req.block, EventType::Batch, &req.batch_id, &req.source_chain_key),
            )?;
        }

        let writes = tx.commit()?;
        info!(parent: &self.span, actor = %actor, batch = %record.batch_id, members = members.len(), writes, "batch created");
        Ok(Created {
            kind: EntityKind::Batch,
            key: record.batch_id,
            chain_key,
            linked: members,
        })
    }

    // ---- Transfers ----

    /// Record a custody transfer in both parties' logs and the item's chain.
    pub fn transfer_item(&self, actor: &Actor, req: &TransferItem) -> LedgerResult<TransferRecord> {
        req.validate()?;
        self.guard.authorize_transfer(actor, &req.from)?;

        let mut tx = self.store.transaction()?;
        let kind = self
            .entities
            .kind_of(&tx, &req.item_id)?
            .ok_or_else(|| LedgerError::validation(format!("unknown item {}", req.item_id)))?;

        let date = if req.date.trim().is_empty() {
            Utc::now().format("%Y-%m-%d").to_string()
        } else {
            req.date.clone()
        };
        let record = TransferRecord {
            id: req.item_id.clone(),
            value: req.item_value.clone(),
            description: req.description.clone(),
            from: req.from.clone(),
            to: req.to.clone(),
            date,
        };
        self.transfers.append(&mut tx, &record.from, &record)?;
        self.transfers.append(&mut tx, &record.to, &record)?;
        self.chains.append_event(
            &mut tx,
            &kind.chain_key(&record.id),
            ChainEvent::new(
                &record.date,
                EventType::Transfer,
                format!("{}->{}", record.from, record.to),
                &record.value,
            ),
        )?;

        let writes = tx.commit()?;
        info!(parent: &self.span, actor = %actor, item = %record.id, from = %record.from, to = %record.to, writes, "custody transferred");
        Ok(record)
    }

    // ---- Maintenance ----

    /// Write empty global registries where none exist. Returns the keys written.
    pub fn init(&self) -> LedgerResult<Vec<String>> {
        let mut tx = self.store.transaction()?;
        let mut written = Vec::new();
        for registry in EntityKind::ALL.iter().filter_map(|k| k.registry_key()) {
            if self.registry.initialize(&mut tx, registry)? {
                written.push(registry.to_string());
            }
        }
        tx.commit()?;
        debug!(parent: &self.span, count = written.len(), "registries initialized");
        Ok(written)
    }

    // ---- Queries ----

    /// The stored envelope (kind and record) under `key`.
    pub fn get_item(&self, key: &str) -> LedgerResult<Envelope> {
        let tx = self.store.transaction()?;
        Ok(self.entities.get_raw(&tx, key)?)
    }

    /// Global registry contents for `kind`, in creation order.
    pub fn get_all_of_kind(&self, kind: EntityKind) -> LedgerResult<Vec<String>> {
        let registry = kind.registry_key().ok_or_else(|| {
            LedgerError::validation(format!("{kind} has no global registry; list by custodian"))
        })?;
        let tx = self.store.transaction()?;
        Ok(self.registry.list_all(&tx, registry)?)
    }

    /// Per-custodian registry for `kind` (animals or batches).
    pub fn get_custodian_list(&self, custodian: &str, kind: EntityKind) -> LedgerResult<Vec<String>> {
        let key = kind.custodian_list_key(custodian).ok_or_else(|| {
            LedgerError::validation(format!("{kind} has no per-custodian registry"))
        })?;
        let tx = self.store.transaction()?;
        Ok(self.registry.list_all(&tx, &key)?)
    }

    /// Events of the chain belonging to `tag`, oldest first.
    pub fn get_chain(&self, tag: &str) -> LedgerResult<Vec<ChainEvent>> {
        let tx = self.store.transaction()?;
        let key = self.resolve_chain(&tx, tag)?;
        Ok(self.chains.read_chain(&tx, &key)?)
    }

    pub fn verify_chain(&self, tag: &str) -> LedgerResult<ChainReport> {
        let tx = self.store.transaction()?;
        let key = self.resolve_chain(&tx, tag)?;
        Ok(self.chains.verify_chain(&tx, &key)?)
    }

    /// Transfers involving `party`, oldest first.
    pub fn get_transfers(&self, party: &str) -> LedgerResult<Vec<TransferRecord>> {
        let tx = self.store.transaction()?;
        Ok(self.transfers.read(&tx, party)?)
    }

    /// Raw stored value under `key`, decoded as UTF-8.
    pub fn read_raw(&self, key: &str) -> LedgerResult<Option<String>> {
        let tx = self.store.transaction()?;
        let bytes = tx.get(key)?;
        Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    // ---- Internals ----

    fn register(
        &self,
        tx: &mut Transaction<'_>,
        kind: EntityKind,
        key: &str,
        custodian: Option<&str>,
    ) -> LedgerResult<()> {
        if let Some(registry) = kind.registry_key() {
            self.registry.append(tx, registry, key)?;
        }
        if let Some(list) = custodian.and_then(|c| kind.custodian_list_key(c)) {
            self.registry.append(tx, &list, key)?;
        }
        Ok(())
    }

    /// Checks the upstream record named by a derived entity. Returns `false`
    /// when the record is absent and absence is allowed by configuration.
    fn check_upstream(
        &self,
        view: &dyn KvView,
        key: &str,
        expected: EntityKind,
    ) -> LedgerResult<bool> {
        match self.entities.kind_of(view, key)? {
            Some(kind) if kind == expected => Ok(true),
            Some(kind) => Err(LedgerError::validation(format!(
                "source {key} is a {kind} record, expected {expected}"
            ))),
            None if self.config.require_upstream_record => Err(LedgerError::validation(
                format!("unknown source {expected} {key}"),
            )),
            None => Ok(false),
        }
    }

    /// The animal chain a new package links to: derived from its processed
    /// good's `sourceTag`, cross-checked against any caller-named chain.
    fn animal_chain_for_package(
        &self,
        view: &dyn KvView,
        req: &CreatePackagedGood,
    ) -> LedgerResult<ChainKey> {
        let named = req.named_animal_chain()?;
        if !self.check_upstream(view, &req.source_tag, EntityKind::ProcessedGood)? {
            return named.ok_or_else(|| {
                LedgerError::validation(format!(
                    "sourceChainKey is required when processed good {} is not on record",
                    req.source_tag
                ))
            });
        }

        let source: ProcessedGood = self.entities.get(view, &req.source_tag)?;
        let derived = EntityKind::Animal.chain_key(&source.source_tag);
        match named {
            Some(named) if named != derived => Err(LedgerError::validation(format!(
                "sourceChainKey {named} does not match {derived} recorded for {}",
                req.source_tag
            ))),
            _ => Ok(derived),
        }
    }

    /// Chain key for an entity key, or a literal chain key when no entity
    /// is stored under `tag`.
    fn resolve_chain(&self, view: &dyn KvView, tag: &str) -> LedgerResult<ChainKey> {
        if let Some(kind) = self.entities.kind_of(view, tag)? {
            return Ok(kind.chain_key(tag));
        }
        match ChainKey::parse(tag) {
            Ok((kind, inner)) => Ok(kind.chain_key(&inner)),
            Err(_) => Err(LedgerError::validation(format!("unknown item {tag}"))),
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
