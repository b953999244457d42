use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, Span};

use prov_types::{Entity, EntityKind};

use crate::codec::{decode, encode};
use crate::error::{StoreError, StoreResult};
use crate::traits::KvView;

/// Current revision of the record envelope.
pub const RECORD_REVISION: u32 = 1;

/// Persisted form of a primary record.
///
/// The kind travels with the record so a bare tag can be resolved to its
/// entity kind (and hence its chain key) without guessing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: EntityKind,
    pub revision: u32,
    pub record: serde_json::Value,
}

impl Envelope {
    fn wrap<E: Entity>(record: &E) -> StoreResult<Self> {
        let record =
            serde_json::to_value(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            kind: E::KIND,
            revision: RECORD_REVISION,
            record,
        })
    }

    fn unwrap_as<E: Entity>(self, key: &str) -> StoreResult<E> {
        if self.kind != E::KIND {
            return Err(StoreError::KindMismatch {
                key: key.to_string(),
                expected: E::KIND,
                found: self.kind,
            });
        }
        serde_json::from_value(self.record).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Typed read/modify/write over a [`KvView`].
///
/// Every method touches exactly one key. An absent key and a zero-length
/// value are both "absent"; a non-empty value that fails to decode is
/// [`StoreError::Corrupt`] and is never mistaken for absence.
#[derive(Clone, Debug)]
pub struct EntityStore {
    span: Span,
}

impl EntityStore {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// Persist a new primary record. Fails with [`StoreError::Conflict`] when
    /// the key already holds a record.
    pub fn create<E: Entity>(&self, view: &mut dyn KvView, record: &E) -> StoreResult<()> {
        let key = record.key();
        self.ensure_vacant(view, key)?;
        let bytes = encode(&Envelope::wrap(record)?)?;
        view.put(key, bytes)?;
        let kind = E::KIND;
        debug!(parent: &self.span, key, %kind, "entity created");
        Ok(())
    }

    /// Succeeds when `key` is free for a new record.
    pub fn ensure_vacant(&self, view: &dyn KvView, key: &str) -> StoreResult<()> {
        match self.get_raw(view, key) {
            Ok(_) => Err(StoreError::Conflict(key.to_string())),
            Err(StoreError::Absent(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Read and decode a primary record of kind `E`.
    pub fn get<E: Entity>(&self, view: &dyn KvView, key: &str) -> StoreResult<E> {
        self.get_raw(view, key)?.unwrap_as(key)
    }

    /// Read the envelope under `key` without committing to a kind.
    pub fn get_raw(&self, view: &dyn KvView, key: &str) -> StoreResult<Envelope> {
        match view.get(key)? {
            Some(bytes) if !bytes.is_empty() => decode(key, &bytes),
            _ => Err(StoreError::Absent(key.to_string())),
        }
    }

    /// Kind of the record under `key`, or `None` if the key is absent.
    pub fn kind_of(&self, view: &dyn KvView, key: &str) -> StoreResult<Option<EntityKind>> {
        match self.get_raw(view, key) {
            Ok(envelope) => Ok(Some(envelope.kind)),
            Err(StoreError::Absent(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Unconditional overwrite of a non-entity value (registries, chains, logs).
    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        view: &mut dyn KvView,
        key: &str,
        value: &T,
    ) -> StoreResult<()> {
        view.put(key, encode(value)?)
    }

    /// Typed read of a non-entity value; `None` when absent or empty.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        view: &dyn KvView,
        key: &str,
    ) -> StoreResult<Option<T>> {
        match view.get(key)? {
            Some(bytes) if !bytes.is_empty() => decode(key, &bytes).map(Some),
            _ => Ok(None),
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(Span::none())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::InMemoryKvStore;
    use crate::traits::KvStore;
    use crate::transaction::SerialStore;
    use prov_types::{ProcessedGood, TrackedAnimal};

    fn animal(tag: &str) -> TrackedAnimal {
        TrackedAnimal {
            species: "bovine".into(),
            animal_type: "angus".into(),
            id: format!("id-{tag}"),
            tag: tag.into(),
            birthdate: "2024-01-01".into(),
            weight: 300.0,
            custodian_id: "FarmerA".into(),
            status: "alive".into(),
            certificate: "c".into(),
        }
    }

    fn setup() -> (Arc<InMemoryKvStore>, SerialStore, EntityStore) {
        let backend = Arc::new(InMemoryKvStore::new());
        let store = SerialStore::new(backend.clone());
        (backend, store, EntityStore::default())
    }

    #[test]
    fn create_then_get() {
        let (_b, store, entities) = setup();
        let mut tx = store.transaction().unwrap();
        entities.create(&mut tx, &animal("T01")).unwrap();
        let back: TrackedAnimal = entities.get(&tx, "T01").unwrap();
        assert_eq!(back, animal("T01"));
        assert_eq!(
            entities.kind_of(&tx, "T01").unwrap(),
            Some(EntityKind::Animal)
        );
    }

    #[test]
    fn create_twice_conflicts() {
        let (_b, store, entities) = setup();
        let mut tx = store.transaction().unwrap();
        entities.create(&mut tx, &animal("T01")).unwrap();
        let err = entities.create(&mut tx, &animal("T01")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(k) if k == "T01"));
    }

    #[test]
    fn empty_value_counts_as_vacant() {
        let (backend, store, entities) = setup();
        backend.put("T01", b"").unwrap();
        let mut tx = store.transaction().unwrap();
        entities.create(&mut tx, &animal("T01")).unwrap();
    }

    #[test]
    fn undecodable_value_is_corrupt_not_vacant() {
        let (backend, store, entities) = setup();
        backend.put("T01", b"\"legacy\"").unwrap();
        let mut tx = store.transaction().unwrap();
        let err = entities.create(&mut tx, &animal("T01")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn get_absent_key() {
        let (_b, store, entities) = setup();
        let tx = store.transaction().unwrap();
        let err = entities.get::<TrackedAnimal>(&tx, "nope").unwrap_err();
        assert!(matches!(err, StoreError::Absent(_)));
        assert_eq!(entities.kind_of(&tx, "nope").unwrap(), None);
    }

    #[test]
    fn get_with_wrong_kind() {
        let (_b, store, entities) = setup();
        let mut tx = store.transaction().unwrap();
        entities.create(&mut tx, &animal("T01")).unwrap();
        let err = entities.get::<ProcessedGood>(&tx, "T01").unwrap_err();
        assert!(matches!(
            err,
            StoreError::KindMismatch {
                expected: EntityKind::ProcessedGood,
                found: EntityKind::Animal,
                ..
            }
        ));
    }

    #[test]
    fn envelope_carries_revision() {
        let (backend, store, entities) = setup();
        let mut tx = store.transaction().unwrap();
        entities.create(&mut tx, &animal("T01")).unwrap();
        tx.commit().unwrap();
        let raw = backend.get("T01").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["kind"], "animal");
        assert_eq!(json["revision"], RECORD_REVISION);
        assert_eq!(json["record"]["tag"], "T01");
    }

    #[test]
    fn json_values_absent_vs_present() {
        let (backend, store, entities) = setup();
        backend.put("blank", b"").unwrap();
        let mut tx = store.transaction().unwrap();
        assert_eq!(entities.get_json::<Vec<String>>(&tx, "missing").unwrap(), None);
        assert_eq!(entities.get_json::<Vec<String>>(&tx, "blank").unwrap(), None);
        entities
            .put_json(&mut tx, "list", &vec!["a".to_string()])
            .unwrap();
        assert_eq!(
            entities.get_json::<Vec<String>>(&tx, "list").unwrap(),
            Some(vec!["a".to_string()])
        );
    }
}
