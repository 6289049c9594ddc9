use chrono::{DateTime, Duration, Utc};

use creamery_core::DomainResult;
use creamery_events::{Notification, NotificationSink};
use creamery_production::{Batch, BatchStatus};
use creamery_products::Product;
use creamery_store::{TxStore, decode};

use crate::collections;

/// Shelf life assumed for products that do not declare one.
pub const DEFAULT_SHELF_LIFE_DAYS: u32 = 7;

/// How far ahead of expiry the warning fires.
pub const WARNING_HORIZON_DAYS: i64 = 7;

/// Warn about batches whose output expires within the next week.
///
/// Covers completed batches and batches still in progress; shelf life starts
/// ticking at production start, not at completion. Expiry is the batch's
/// start time plus the linked product's shelf life (or
/// [`DEFAULT_SHELF_LIFE_DAYS`] when the batch has no product link or the
/// product declares none). Already-expired batches are not warned about;
/// they are waste, not a heads-up. Returns how many warnings fired.
pub fn warn_expiring_batches<S, N>(store: &S, sink: &N, now: DateTime<Utc>) -> DomainResult<usize>
where
    S: TxStore,
    N: NotificationSink,
{
    let horizon = now + Duration::days(WARNING_HORIZON_DAYS);
    let mut warned = 0;

    for record in store.list(collections::BATCHES)? {
        let batch: Batch = decode(&record)?;
        if !matches!(
            batch.status(),
            BatchStatus::Completed | BatchStatus::InProgress
        ) {
            continue;
        }

        let shelf_life_days = batch
            .product_id()
            .and_then(|id| store.get(collections::PRODUCTS, id.into()).ok().flatten())
            .and_then(|record| decode::<Product>(&record).ok())
            .and_then(|product| product.shelf_life_days())
            .unwrap_or(DEFAULT_SHELF_LIFE_DAYS);
        let expires_on = batch.start_time() + Duration::days(i64::from(shelf_life_days));

        if expires_on <= now || expires_on > horizon {
            continue;
        }
        sink.notify(Notification::BatchExpiring {
            batch_id: batch.id_typed(),
            batch_number: batch.batch_number().to_string(),
            product: batch.product().to_string(),
            expires_on,
        });
        warned += 1;
    }

    if warned > 0 {
        tracing::info!(warned, "expiration warnings emitted");
    }
    Ok(warned)
}
