//! Per-entity header chains.
//!
//! A header chain is the audit trail of one entity, stored as a JSON array
//! under `<kind prefix>-<tag>`. [`HeaderChainEngine::append_event`] is the
//! only code path that writes a chain.

use serde::{Deserialize, Serialize};
use tracing::{debug, Span};

use prov_store::{EntityStore, KvView};
use prov_types::{ChainEvent, ChainKey, EntityKind};

use crate::digest::EventDigest;
use crate::error::ChainResult;
use crate::list;

/// A chain event as persisted: the caller's event plus its position and,
/// when sealing is enabled, its digest link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedEvent {
    /// 1-based position in the chain.
    pub seq: u64,
    #[serde(flatten)]
    pub event: ChainEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Outcome of [`HeaderChainEngine::verify_chain`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub chain_key: ChainKey,
    pub length: usize,
    /// Events that carry a digest.
    pub sealed: usize,
    pub violations: Vec<Violation>,
}

impl ChainReport {
    /// Returns `true` if no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity problem found in a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    SequenceGap,
    LinkBreak,
    DigestMismatch,
}

/// Append and read primitive for header chains.
#[derive(Clone, Debug)]
pub struct HeaderChainEngine {
    entities: EntityStore,
    seal: bool,
    span: Span,
}

impl HeaderChainEngine {
    /// `seal` controls whether appended events carry a digest link.
    pub fn new(span: Span, seal: bool) -> Self {
        Self {
            entities: EntityStore::new(span.clone()),
            seal,
            span,
        }
    }

    /// Pure chain key derivation: `<kind prefix>-<tag>`.
    pub fn chain_key(kind: EntityKind, tag: &str) -> ChainKey {
        ChainKey::derive(kind, tag)
    }

    /// Append `event` to the chain under `key`, creating the chain if absent.
    pub fn append_event(
        &self,
        view: &mut dyn KvView,
        key: &ChainKey,
        event: ChainEvent,
    ) -> ChainResult<SealedEvent> {
        let mut chain: Vec<SealedEvent> = list::load(&self.entities, view, key.as_str())?;
        let seq = chain.len() as u64 + 1;
        let (prev_digest, digest) = if self.seal {
            let prev = chain.last().and_then(|last| last.digest.clone());
            let digest = EventDigest::CHAIN.compute(prev.as_deref(), seq, &event)?;
            (prev, Some(digest))
        } else {
            (None, None)
        };

        let sealed = SealedEvent {
            seq,
            event,
            prev_digest,
            digest,
        };
        chain.push(sealed.clone());
        list::store(&self.entities, view, key.as_str(), &chain)?;

        debug!(
            parent: &self.span,
            chain = %key,
            seq,
            kind = %sealed.event.kind,
            "chain event appended"
        );
        Ok(sealed)
    }

    /// Events of the chain in append order; empty when the chain is absent.
    pub fn read_chain(&self, view: &dyn KvView, key: &ChainKey) -> ChainResult<Vec<ChainEvent>> {
        Ok(self
            .read_sealed(view, key)?
            .into_iter()
            .map(|sealed| sealed.event)
            .collect())
    }

    /// Persisted entries of the chain, including sequence numbers and digests.
    pub fn read_sealed(
        &self,
        view: &dyn KvView,
        key: &ChainKey,
    ) -> ChainResult<Vec<SealedEvent>> {
        list::load(&self.entities, view, key.as_str())
    }

    /// Check sequence numbers and recompute every digest.
    ///
    /// Unsealed events (written while sealing was off) are only checked for
    /// their sequence number.
    pub fn verify_chain(&self, view: &dyn KvView, key: &ChainKey) -> ChainResult<ChainReport> {
        let chain = self.read_sealed(view, key)?;
        let mut violations = Vec::new();
        let mut sealed_count = 0;

        for (index, entry) in chain.iter().enumerate() {
            let expected_seq = index as u64 + 1;
            if entry.seq != expected_seq {
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", entry.seq),
                });
            }

            let Some(stored) = entry.digest.as_deref() else {
                continue;
            };
            sealed_count += 1;

            let expected_prev = index
                .checked_sub(1)
                .and_then(|i| chain[i].digest.as_deref());
            if entry.prev_digest.as_deref() != expected_prev {
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::LinkBreak,
                    description: "previous digest link mismatch".into(),
                });
            }

            let computed =
                EventDigest::CHAIN.compute(entry.prev_digest.as_deref(), entry.seq, &entry.event)?;
            if computed != stored {
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::DigestMismatch,
                    description: "stored digest does not match event content".into(),
                });
            }
        }

        if !violations.is_empty() {
            debug!(parent: &self.span, chain = %key, count = violations.len(), "chain verification failed");
        }

        Ok(ChainReport {
            chain_key: key.clone(),
            length: chain.len(),
            sealed: sealed_count,
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use prov_store::{InMemoryKvStore, KvStore, SerialStore};
    use prov_types::EventType;

    fn engine() -> HeaderChainEngine {
        HeaderChainEngine::new(Span::none(), true)
    }

    fn event(value: &str) -> ChainEvent {
        ChainEvent::new("blk", EventType::Transform, value, "note")
    }

    #[test]
    fn absent_chain_reads_empty() {
        let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
        let tx = store.transaction().unwrap();
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        assert!(engine().read_chain(&tx, &key).unwrap().is_empty());
    }

    #[test]
    fn append_creates_and_extends_chain_in_order() {
        let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
        let mut tx = store.transaction().unwrap();
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        let engine = engine();

        let first = engine.append_event(&mut tx, &key, event("RM01")).unwrap();
        let second = engine.append_event(&mut tx, &key, event("RM02")).unwrap();

        assert_eq!(first.seq, 1);
        assert_eq!(first.prev_digest, None);
        assert_eq!(second.seq, 2);
        assert_eq!(second.prev_digest, first.digest);

        let values: Vec<String> = engine
            .read_chain(&tx, &key)
            .unwrap()
            .into_iter()
            .map(|e| e.value)
            .collect();
        assert_eq!(values, vec!["RM01", "RM02"]);
    }

    #[test]
    fn link_reference_is_kept_verbatim() {
        let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
        let mut tx = store.transaction().unwrap();
        let key = HeaderChainEngine::chain_key(EntityKind::Batch, "B1");
        let mut ev = event("x");
        ev.link_reference = "not-a-hash, anything goes".into();
        engine().append_event(&mut tx, &key, ev.clone()).unwrap();
        assert_eq!(engine().read_chain(&tx, &key).unwrap(), vec![ev]);
    }

    #[test]
    fn persisted_shape_is_flat() {
        let backend = Arc::new(InMemoryKvStore::new());
        let store = SerialStore::new(backend.clone());
        let mut tx = store.transaction().unwrap();
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        engine().append_event(&mut tx, &key, event("RM01")).unwrap();
        tx.commit().unwrap();

        let raw = backend.get("animal-T01").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json[0]["seq"], 1);
        assert_eq!(json[0]["type"], "Transform");
        assert_eq!(json[0]["linkReference"], "note");
        assert!(json[0]["digest"].is_string());
    }

    #[test]
    fn unsealed_engine_writes_no_digest() {
        let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
        let mut tx = store.transaction().unwrap();
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        let engine = HeaderChainEngine::new(Span::none(), false);
        let sealed = engine.append_event(&mut tx, &key, event("a")).unwrap();
        assert!(sealed.digest.is_none());
        let report = engine.verify_chain(&tx, &key).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.sealed, 0);
        assert_eq!(report.length, 1);
    }

    #[test]
    fn verify_detects_tampering() {
        let backend = Arc::new(InMemoryKvStore::new());
        let store = SerialStore::new(backend.clone());
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        {
            let mut tx = store.transaction().unwrap();
            for v in ["a", "b", "c"] {
                engine().append_event(&mut tx, &key, event(v)).unwrap();
            }
            tx.commit().unwrap();
        }

        let raw = backend.get(key.as_str()).unwrap().unwrap();
        let mut chain: Vec<SealedEvent> = serde_json::from_slice(&raw).unwrap();
        chain[1].event.value = "tampered".into();
        backend
            .put(key.as_str(), &serde_json::to_vec(&chain).unwrap())
            .unwrap();

        let tx = store.transaction().unwrap();
        let report = engine().verify_chain(&tx, &key).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.violations[0].seq, 2);
        assert_eq!(report.violations[0].kind, ViolationKind::DigestMismatch);
    }

    #[test]
    fn verify_detects_reordering() {
        let backend = Arc::new(InMemoryKvStore::new());
        let store = SerialStore::new(backend.clone());
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        {
            let mut tx = store.transaction().unwrap();
            engine().append_event(&mut tx, &key, event("a")).unwrap();
            engine().append_event(&mut tx, &key, event("b")).unwrap();
            tx.commit().unwrap();
        }
        let raw = backend.get(key.as_str()).unwrap().unwrap();
        let mut chain: Vec<SealedEvent> = serde_json::from_slice(&raw).unwrap();
        chain.swap(0, 1);
        backend
            .put(key.as_str(), &serde_json::to_vec(&chain).unwrap())
            .unwrap();

        let tx = store.transaction().unwrap();
        let report = engine().verify_chain(&tx, &key).unwrap();
        assert!(report
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::SequenceGap));
    }

    #[test]
    fn corrupt_chain_is_an_error() {
        let backend = Arc::new(InMemoryKvStore::new());
        backend.put("animal-T01", b"{oops").unwrap();
        let store = SerialStore::new(backend);
        let mut tx = store.transaction().unwrap();
        let key = HeaderChainEngine::chain_key(EntityKind::Animal, "T01");
        assert!(engine().append_event(&mut tx, &key, event("a")).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chain_preserves_append_order(values in proptest::collection::vec("[a-z0-9]{1,8}", 0..20)) {
                let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
                let mut tx = store.transaction().unwrap();
                let key = HeaderChainEngine::chain_key(EntityKind::PackagedGood, "FP01");
                let engine = engine();
                for v in &values {
                    engine.append_event(&mut tx, &key, event(v)).unwrap();
                }
                let read: Vec<String> = engine
                    .read_chain(&tx, &key)
                    .unwrap()
                    .into_iter()
                    .map(|e| e.value)
                    .collect();
                prop_assert_eq!(read, values);
                prop_assert!(engine.verify_chain(&tx, &key).unwrap().is_valid());
            }
        }
    }
}
