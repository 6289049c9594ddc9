use std::collections::BTreeMap;
use std::collections::HashSet;

use chrono::NaiveDate;

use creamery_core::{DomainResult, UserId};
use creamery_events::{Notification, NotificationSink, ProductionReport, ProductionReportLine};
use creamery_production::{Batch, BatchStatus};
use creamery_store::{TxStore, decode};

use crate::collections;

/// Aggregate one day's completed batches into a production report and emit
/// it.
///
/// Quantities are yielded output (`quantity × yield / 100`), not nominal
/// batch sizes, so the report matches what actually landed in stock. A day
/// with no completed batches still produces a (zeroed) report; silence and
/// an idle day should not look the same.
pub fn daily_production_report<S, N>(
    store: &S,
    sink: &N,
    date: NaiveDate,
) -> DomainResult<ProductionReport>
where
    S: TxStore,
    N: NotificationSink,
{
    let mut total_production = 0i64;
    let mut batches_completed = 0usize;
    let mut by_product: BTreeMap<String, i64> = BTreeMap::new();
    let mut operators: HashSet<UserId> = HashSet::new();

    for record in store.list(collections::BATCHES)? {
        let batch: Batch = decode(&record)?;
        if batch.status() != BatchStatus::Completed {
            continue;
        }
        let Some(completed_at) = batch.end_time() else {
            continue;
        };
        if completed_at.date_naive() != date {
            continue;
        }

        let produced =
            batch.quantity() * i64::from(batch.yield_pct().unwrap_or(0)) / 100;
        total_production += produced;
        batches_completed += 1;
        *by_product.entry(batch.product().to_string()).or_default() += produced;
        operators.insert(batch.operator_id());
    }

    let report = ProductionReport {
        date,
        total_production,
        batches_completed,
        production_by_product: by_product
            .into_iter()
            .map(|(product_name, quantity)| ProductionReportLine {
                product_name,
                quantity,
            })
            .collect(),
        active_operators: operators.len(),
    };

    tracing::info!(
        date = %report.date,
        total = report.total_production,
        batches = report.batches_completed,
        "daily production report"
    );
    sink.notify(Notification::ProductionReport(report.clone()));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use creamery_auth::{Principal, Role};
    use creamery_events::RecordingSink;
    use creamery_production::NewBatch;
    use creamery_products::{ProductCategory, Unit};
    use creamery_store::InMemoryStore;

    use crate::services::ProductionService;

    fn batch_spec(product: &str, quantity: i64) -> NewBatch {
        NewBatch {
            batch_number: None,
            product: product.to_string(),
            product_type: ProductCategory::Yogurt,
            product_id: None,
            quantity,
            unit: Unit::Liters,
            start_time: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn report_aggregates_yielded_output_per_product() {
        let store = Arc::new(InMemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        let production = ProductionService::new(Arc::clone(&store), Arc::clone(&sink));
        let marie = Principal::new(creamery_core::UserId::new(), "Marie", Role::operator());
        let luc = Principal::new(creamery_core::UserId::new(), "Luc", Role::operator());

        let a = production.create_batch(batch_spec("Plain Yogurt", 500), &marie).unwrap();
        let b = production.create_batch(batch_spec("Plain Yogurt", 200), &luc).unwrap();
        let c = production.create_batch(batch_spec("Brie", 100), &marie).unwrap();
        let pending = production.create_batch(batch_spec("Cream", 300), &marie).unwrap();

        production.complete(a.id_typed(), Some(90), None).unwrap();
        production.complete(b.id_typed(), Some(100), None).unwrap();
        production.complete(c.id_typed(), Some(50), None).unwrap();
        let _ = pending;

        let report =
            daily_production_report(&store, &sink, Utc::now().date_naive()).unwrap();

        // 450 + 200 + 50
        assert_eq!(report.total_production, 700);
        assert_eq!(report.batches_completed, 3);
        assert_eq!(report.active_operators, 2);
        assert_eq!(report.production_by_product.len(), 2);
        let yogurt = report
            .production_by_product
            .iter()
            .find(|line| line.product_name == "Plain Yogurt")
            .unwrap();
        assert_eq!(yogurt.quantity, 650);

        assert_eq!(sink.kinds(), vec!["production-report"]);
    }

    #[test]
    fn idle_day_still_reports_zeroes() {
        let store = Arc::new(InMemoryStore::new());
        let sink = RecordingSink::new();

        let report =
            daily_production_report(&store, &sink, Utc::now().date_naive()).unwrap();
        assert_eq!(report.total_production, 0);
        assert_eq!(report.batches_completed, 0);
        assert!(report.production_by_product.is_empty());
        assert_eq!(sink.kinds(), vec!["production-report"]);
    }
}
