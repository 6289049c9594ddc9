use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use creamery_core::DomainError;

use crate::record::{RecordWrite, StoredRecord};

/// Store operation error.
///
/// These are **infrastructure errors** (lost races, broken payloads), as
/// opposed to domain errors (validation, invariants). Services map them into
/// the domain taxonomy at their boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A precondition in a commit did not hold; nothing was applied.
    #[error("conflict on {collection}/{id}: {detail}")]
    Conflict {
        collection: &'static str,
        id: Uuid,
        detail: String,
    },

    /// A payload could not be (de)serialized.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The store itself is unavailable (e.g. poisoned lock, lost connection).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { .. } => DomainError::conflict(value.to_string()),
            // A timed-out or unavailable store means the write was not
            // applied; safe for the caller to retry, same as a lost race.
            StoreError::Unavailable(msg) => DomainError::conflict(msg),
            StoreError::Corrupt(msg) => DomainError::validation(msg),
        }
    }
}

/// Transactional record store.
///
/// ## Commit semantics
///
/// `commit` is atomic: every write's [`Expected`](crate::Expected)
/// precondition is validated against the current record versions and either
/// all writes apply (each bumping its record's version) or none do and
/// [`StoreError::Conflict`] is returned. This is the only write path; there
/// is deliberately no unguarded `put`.
///
/// ## Implementation requirements
///
/// - Validate all preconditions and apply all writes under one critical
///   section / transaction (no partial application, no lost updates).
/// - Assign versions monotonically per record, starting at 1.
/// - `get`/`list` return committed state only.
pub trait TxStore: Send + Sync {
    /// Fetch one record by collection + id.
    fn get(&self, collection: &'static str, id: Uuid) -> Result<Option<StoredRecord>, StoreError>;

    /// All records of a collection (used by sweeps and reports).
    fn list(&self, collection: &'static str) -> Result<Vec<StoredRecord>, StoreError>;

    /// Atomically apply a batch of precondition-checked writes.
    fn commit(&self, writes: Vec<RecordWrite>) -> Result<(), StoreError>;
}

impl<S> TxStore for Arc<S>
where
    S: TxStore + ?Sized,
{
    fn get(&self, collection: &'static str, id: Uuid) -> Result<Option<StoredRecord>, StoreError> {
        (**self).get(collection, id)
    }

    fn list(&self, collection: &'static str) -> Result<Vec<StoredRecord>, StoreError> {
        (**self).list(collection)
    }

    fn commit(&self, writes: Vec<RecordWrite>) -> Result<(), StoreError> {
        (**self).commit(writes)
    }
}
