use tracing::{debug, Span};

use prov_store::{EntityStore, KvView};
use prov_types::TransferRecord;

use crate::error::ChainResult;
use crate::list;

/// Per-party log of custody transfers, stored under `transfer-log:<party>`.
#[derive(Clone, Debug)]
pub struct TransferLog {
    entities: EntityStore,
    span: Span,
}

impl TransferLog {
    pub fn new(span: Span) -> Self {
        Self {
            entities: EntityStore::new(span.clone()),
            span,
        }
    }

    /// Append `record` to `party`'s log. Returns the new log length.
    pub fn append(
        &self,
        view: &mut dyn KvView,
        party: &str,
        record: &TransferRecord,
    ) -> ChainResult<usize> {
        let key = TransferRecord::log_key(party);
        let mut records: Vec<TransferRecord> = list::load(&self.entities, view, &key)?;
        records.push(record.clone());
        list::store(&self.entities, view, &key, &records)?;
        debug!(parent: &self.span, party, item = %record.id, size = records.len(), "transfer logged");
        Ok(records.len())
    }

    /// All transfers involving `party`, oldest first.
    pub fn read(&self, view: &dyn KvView, party: &str) -> ChainResult<Vec<TransferRecord>> {
        list::load(&self.entities, view, &TransferRecord::log_key(party))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use prov_store::{InMemoryKvStore, SerialStore};

    fn record(id: &str) -> TransferRecord {
        TransferRecord {
            id: id.into(),
            value: "1".into(),
            description: "truck".into(),
            from: "FarmerA".into(),
            to: "Processor".into(),
            date: "2024-06-01".into(),
        }
    }

    #[test]
    fn logs_are_independent_per_party() {
        let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
        let mut tx = store.transaction().unwrap();
        let log = TransferLog::new(Span::none());

        assert_eq!(log.append(&mut tx, "FarmerA", &record("T01")).unwrap(), 1);
        assert_eq!(log.append(&mut tx, "Processor", &record("T01")).unwrap(), 1);
        assert_eq!(log.append(&mut tx, "FarmerA", &record("T02")).unwrap(), 2);

        assert_eq!(log.read(&tx, "FarmerA").unwrap().len(), 2);
        assert_eq!(log.read(&tx, "Processor").unwrap(), vec![record("T01")]);
        assert!(log.read(&tx, "Nobody").unwrap().is_empty());
    }

    #[test]
    fn repeated_transfers_are_all_kept() {
        let store = SerialStore::new(Arc::new(InMemoryKvStore::new()));
        let mut tx = store.transaction().unwrap();
        let log = TransferLog::new(Span::none());
        log.append(&mut tx, "FarmerA", &record("T01")).unwrap();
        log.append(&mut tx, "FarmerA", &record("T01")).unwrap();
        assert_eq!(log.read(&tx, "FarmerA").unwrap().len(), 2);
    }
}
