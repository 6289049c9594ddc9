use chrono::Utc;

use creamery_auth::Principal;
use creamery_core::{BatchId, DomainResult};
use creamery_events::NotificationSink;
use creamery_production::{Batch, NewBatch, QualityCheckUpdate};
use creamery_store::{RecordWrite, TxStore};

use crate::collections;
use crate::services::{StockLedger, load, load_all, with_retry};

/// Tracks production batches from creation to a terminal state.
///
/// Completion is the one operation that touches stock: the batch's terminal
/// write and the product credit go into a single atomic commit, so a crash
/// or lost race can never leave a completed batch without its credit (or the
/// credit applied twice).
#[derive(Debug, Clone)]
pub struct ProductionService<S, N> {
    store: S,
    ledger: StockLedger<S, N>,
}

impl<S, N> ProductionService<S, N>
where
    S: TxStore + Clone,
    N: NotificationSink + Clone,
{
    pub fn new(store: S, sink: N) -> Self {
        Self {
            ledger: StockLedger::new(store.clone(), sink),
            store,
        }
    }

    /// Create a batch, recording who operates it.
    pub fn create_batch(&self, spec: NewBatch, operator: &Principal) -> DomainResult<Batch> {
        let batch = Batch::new(
            BatchId::new(),
            spec,
            operator.user_id,
            operator.name.clone(),
        )?;
        self.store.commit(vec![RecordWrite::insert(
            collections::BATCHES,
            batch.id_typed(),
            &batch,
        )?])?;
        tracing::info!(
            batch_number = batch.batch_number(),
            product = batch.product(),
            "batch created"
        );
        Ok(batch)
    }

    pub fn get(&self, id: BatchId) -> DomainResult<Batch> {
        let (batch, _) = load(&self.store, collections::BATCHES, id)?;
        Ok(batch)
    }

    pub fn list(&self) -> DomainResult<Vec<Batch>> {
        load_all(&self.store, collections::BATCHES)
    }

    pub fn start(&self, id: BatchId) -> DomainResult<Batch> {
        self.mutate(id, |batch| batch.start())
    }

    pub fn record_quality_checks(
        &self,
        id: BatchId,
        update: QualityCheckUpdate,
    ) -> DomainResult<Batch> {
        self.mutate(id, |batch| batch.record_quality_checks(update))
    }

    /// Complete a batch, crediting the linked product with the yielded
    /// quantity in the same commit.
    pub fn complete(
        &self,
        id: BatchId,
        yield_pct: Option<u8>,
        checks: Option<QualityCheckUpdate>,
    ) -> DomainResult<Batch> {
        with_retry(|| {
            let (mut batch, version): (Batch, u64) = load(&self.store, collections::BATCHES, id)?;
            let credit = batch.complete(yield_pct, checks, Utc::now())?;

            let mut writes = vec![RecordWrite::update(
                collections::BATCHES,
                id,
                version,
                &batch,
            )?];
            if let Some((product_id, quantity)) = credit {
                writes.push(self.ledger.prepare_credit(product_id, quantity)?);
            }
            self.store.commit(writes)?;

            tracing::info!(
                batch_number = batch.batch_number(),
                credited = credit.map(|(_, q)| q).unwrap_or(0),
                "batch completed"
            );
            Ok(batch)
        })
    }

    pub fn fail(&self, id: BatchId) -> DomainResult<Batch> {
        self.mutate(id, |batch| batch.fail(Utc::now()))
    }

    pub fn cancel(&self, id: BatchId) -> DomainResult<Batch> {
        self.mutate(id, |batch| batch.cancel(Utc::now()))
    }

    fn mutate(
        &self,
        id: BatchId,
        op: impl Fn(&mut Batch) -> DomainResult<()>,
    ) -> DomainResult<Batch> {
        with_retry(|| {
            let (mut batch, version): (Batch, u64) = load(&self.store, collections::BATCHES, id)?;
            op(&mut batch)?;
            self.store.commit(vec![RecordWrite::update(
                collections::BATCHES,
                id,
                version,
                &batch,
            )?])?;
            Ok(batch)
        })
    }
}
