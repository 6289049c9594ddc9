use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::r#trait::StoreError;

/// Precondition on the current version of a record, checked at commit time.
///
/// Every write carries one; this is how lost updates are prevented without
/// pessimistic locks. A reserve built against version `n` of a product only
/// applies if the product is still at version `n` when the commit lands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Expected {
    /// The record must not exist yet (insert).
    NoRecord,
    /// The record must be at exactly this version (conditional update).
    Exact(u64),
    /// Skip the check (administrative writes, caches).
    Any,
}

impl Expected {
    pub fn matches(self, current: Option<u64>) -> bool {
        match self {
            Expected::NoRecord => current.is_none(),
            Expected::Exact(v) => current == Some(v),
            Expected::Any => true,
        }
    }
}

/// A versioned record as persisted: one JSON document per entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub collection: &'static str,
    pub id: Uuid,
    /// Incremented by the store on every successful write (starts at 1).
    pub version: u64,
    pub payload: JsonValue,
}

/// A precondition-checked write, ready to be committed.
///
/// Built from a typed entity via [`RecordWrite::insert`] or
/// [`RecordWrite::update`]; the store never sees domain types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordWrite {
    pub collection: &'static str,
    pub id: Uuid,
    pub expected: Expected,
    pub payload: JsonValue,
}

impl RecordWrite {
    /// Write that creates a record (fails if one already exists).
    pub fn insert<T: Serialize>(
        collection: &'static str,
        id: impl Into<Uuid>,
        value: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            collection,
            id: id.into(),
            expected: Expected::NoRecord,
            payload: to_payload(value)?,
        })
    }

    /// Write that replaces a record, conditional on its current version.
    pub fn update<T: Serialize>(
        collection: &'static str,
        id: impl Into<Uuid>,
        expected_version: u64,
        value: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            collection,
            id: id.into(),
            expected: Expected::Exact(expected_version),
            payload: to_payload(value)?,
        })
    }

    /// Unconditional write (last-writer-wins; reserved for derived caches).
    pub fn upsert<T: Serialize>(
        collection: &'static str,
        id: impl Into<Uuid>,
        value: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            collection,
            id: id.into(),
            expected: Expected::Any,
            payload: to_payload(value)?,
        })
    }
}

/// Decode a stored payload back into a typed entity.
pub fn decode<T: DeserializeOwned>(record: &StoredRecord) -> Result<T, StoreError> {
    serde_json::from_value(record.payload.clone()).map_err(|e| {
        StoreError::Corrupt(format!(
            "{}/{}: payload deserialization failed: {e}",
            record.collection, record.id
        ))
    })
}

fn to_payload<T: Serialize>(value: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::Corrupt(format!("payload serialization failed: {e}")))
}
