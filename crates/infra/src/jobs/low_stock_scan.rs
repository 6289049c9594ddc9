use creamery_core::DomainResult;
use creamery_events::{Notification, NotificationSink};
use creamery_products::{Product, StockStatus};
use creamery_store::{TxStore, decode};

use crate::collections;

/// Emit a low-stock notification for every product currently below its
/// threshold.
///
/// The ledger warns once at the moment a mutation crosses the threshold;
/// this scan is the periodic reminder for shortages that linger. Returns
/// how many products were flagged.
pub fn scan_low_stock<S, N>(store: &S, sink: &N) -> DomainResult<usize>
where
    S: TxStore,
    N: NotificationSink,
{
    let mut flagged = 0;
    for record in store.list(collections::PRODUCTS)? {
        let product: Product = decode(&record)?;
        if product.status() == StockStatus::Normal {
            continue;
        }
        sink.notify(Notification::LowStock {
            product_id: product.id_typed(),
            product_name: product.name().to_string(),
            current_stock: product.current_stock(),
            min_threshold: product.min_threshold(),
        });
        flagged += 1;
    }

    if flagged > 0 {
        tracing::info!(flagged, "low stock scan flagged products");
    }
    Ok(flagged)
}
