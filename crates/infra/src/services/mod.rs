//! Application services.
//!
//! Every service follows the same shape: load a versioned record, run the
//! pure domain mutation, commit conditionally on the version read, retry a
//! bounded number of times on a lost race. Notifications fire only after a
//! successful commit.

pub mod client_ledger;
pub mod fulfillment;
pub mod invoicing;
pub mod production;
pub mod stock_ledger;

pub use client_ledger::ClientLedger;
pub use fulfillment::FulfillmentService;
pub use invoicing::InvoicingService;
pub use production::ProductionService;
pub use stock_ledger::StockLedger;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use creamery_core::{DomainError, DomainResult};
use creamery_store::{TxStore, decode};

/// How many times a load-mutate-commit cycle is retried after losing a
/// version race before the conflict is surfaced to the caller.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Load one entity plus the record version the commit must be conditioned on.
pub(crate) fn load<S: TxStore, T: DeserializeOwned>(
    store: &S,
    collection: &'static str,
    id: impl Into<Uuid>,
) -> DomainResult<(T, u64)> {
    let record = store
        .get(collection, id.into())?
        .ok_or_else(DomainError::not_found)?;
    let entity = decode(&record)?;
    Ok((entity, record.version))
}

/// Decode a whole collection.
pub(crate) fn load_all<S: TxStore, T: DeserializeOwned>(
    store: &S,
    collection: &'static str,
) -> DomainResult<Vec<T>> {
    store
        .list(collection)?
        .iter()
        .map(|record| decode(record).map_err(DomainError::from))
        .collect()
}

/// Run a load-mutate-commit cycle, retrying on concurrency conflicts only.
///
/// The closure must re-read its own inputs on every attempt; any state it
/// captured from a previous attempt is stale by definition.
pub(crate) fn with_retry<T>(mut attempt: impl FnMut() -> DomainResult<T>) -> DomainResult<T> {
    let mut last = None;
    for _ in 0..MAX_COMMIT_ATTEMPTS {
        match attempt() {
            Err(DomainError::Conflict(detail)) => {
                tracing::debug!(%detail, "commit lost a version race, retrying");
                last = Some(DomainError::Conflict(detail));
            }
            other => return other,
        }
    }
    Err(last.unwrap_or_else(|| DomainError::conflict("commit retries exhausted")))
}
