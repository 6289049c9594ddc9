use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::record::{RecordWrite, StoredRecord};
use crate::r#trait::{StoreError, TxStore};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    collection: &'static str,
    id: Uuid,
}

/// In-memory transactional record store.
///
/// Intended for tests/dev. Commits validate every precondition and apply
/// every write while holding the write lock, which gives the same atomicity
/// and isolation a backing database transaction would.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TxStore for InMemoryStore {
    fn get(&self, collection: &'static str, id: Uuid) -> Result<Option<StoredRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(records.get(&RecordKey { collection, id }).cloned())
    }

    fn list(&self, collection: &'static str) -> Result<Vec<StoredRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let mut out: Vec<StoredRecord> = records
            .values()
            .filter(|r| r.collection == collection)
            .cloned()
            .collect();

        // Deterministic order for sweeps and tests.
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    fn commit(&self, writes: Vec<RecordWrite>) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // Phase 1: validate every precondition before touching anything.
        for w in &writes {
            let key = RecordKey {
                collection: w.collection,
                id: w.id,
            };
            let current = records.get(&key).map(|r| r.version);
            if !w.expected.matches(current) {
                return Err(StoreError::Conflict {
                    collection: w.collection,
                    id: w.id,
                    detail: format!("expected {:?}, found {current:?}", w.expected),
                });
            }
        }

        // Phase 2: apply. All preconditions held, so this cannot fail.
        for w in writes {
            let key = RecordKey {
                collection: w.collection,
                id: w.id,
            };
            let next_version = records.get(&key).map(|r| r.version + 1).unwrap_or(1);
            records.insert(
                key,
                StoredRecord {
                    collection: w.collection,
                    id: w.id,
                    version: next_version,
                    payload: w.payload,
                },
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Row {
        n: i64,
    }

    const COLL: &str = "rows";

    #[test]
    fn insert_then_get_round_trips() {
        let store = InMemoryStore::new();
        let id = Uuid::now_v7();

        store
            .commit(vec![RecordWrite::insert(COLL, id, &Row { n: 7 }).unwrap()])
            .unwrap();

        let record = store.get(COLL, id).unwrap().unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(decode::<Row>(&record).unwrap(), Row { n: 7 });
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let store = InMemoryStore::new();
        let id = Uuid::now_v7();

        store
            .commit(vec![RecordWrite::insert(COLL, id, &Row { n: 1 }).unwrap()])
            .unwrap();
        let err = store
            .commit(vec![RecordWrite::insert(COLL, id, &Row { n: 2 }).unwrap()])
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn stale_version_update_conflicts() {
        let store = InMemoryStore::new();
        let id = Uuid::now_v7();

        store
            .commit(vec![RecordWrite::insert(COLL, id, &Row { n: 1 }).unwrap()])
            .unwrap();
        store
            .commit(vec![RecordWrite::update(COLL, id, 1, &Row { n: 2 }).unwrap()])
            .unwrap();

        // A writer still holding version 1 must lose.
        let err = store
            .commit(vec![RecordWrite::update(COLL, id, 1, &Row { n: 3 }).unwrap()])
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let record = store.get(COLL, id).unwrap().unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(decode::<Row>(&record).unwrap(), Row { n: 2 });
    }

    #[test]
    fn failed_batch_applies_nothing() {
        let store = InMemoryStore::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        store
            .commit(vec![RecordWrite::insert(COLL, a, &Row { n: 1 }).unwrap()])
            .unwrap();

        // Batch: valid update of `a` + conflicting insert of `a` again via `b`'s slot.
        let err = store
            .commit(vec![
                RecordWrite::update(COLL, a, 1, &Row { n: 10 }).unwrap(),
                RecordWrite::insert(COLL, b, &Row { n: 2 }).unwrap(),
                RecordWrite::insert(COLL, a, &Row { n: 3 }).unwrap(),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Nothing from the batch landed, including the valid writes.
        let record = store.get(COLL, a).unwrap().unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(decode::<Row>(&record).unwrap(), Row { n: 1 });
        assert!(store.get(COLL, b).unwrap().is_none());
    }

    #[test]
    fn concurrent_conditional_updates_one_wins() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryStore::new());
        let id = Uuid::now_v7();
        store
            .commit(vec![RecordWrite::insert(COLL, id, &Row { n: 0 }).unwrap()])
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store.commit(vec![
                    RecordWrite::update(COLL, id, 1, &Row { n: i }).unwrap(),
                ])
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        // All writers expected version 1, so exactly one may land.
        assert_eq!(successes, 1);
        assert_eq!(store.get(COLL, id).unwrap().unwrap().version, 2);
    }
}
