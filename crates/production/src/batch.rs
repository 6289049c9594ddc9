use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{BatchId, DomainError, DomainResult, Entity, ProductId, UserId};
use creamery_products::{ProductCategory, Unit};

/// Production batch lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Cancelled
        )
    }
}

/// Outcome of a single quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckResult {
    #[default]
    Pending,
    Passed,
    Failed,
}

/// The closed set of quality checks run on every batch.
///
/// A fixed struct rather than an open map, so merges and "all pending"
/// initialization stay checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QualityChecks {
    pub temperature: CheckResult,
    pub ph: CheckResult,
    pub bacteria: CheckResult,
}

/// Partial quality-check result; merged into the batch, never replacing
/// checks it does not mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QualityCheckUpdate {
    pub temperature: Option<CheckResult>,
    pub ph: Option<CheckResult>,
    pub bacteria: Option<CheckResult>,
}

impl creamery_core::ValueObject for QualityChecks {}

impl QualityChecks {
    pub fn merge(&mut self, update: QualityCheckUpdate) {
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(ph) = update.ph {
            self.ph = ph;
        }
        if let Some(bacteria) = update.bacteria {
            self.bacteria = bacteria;
        }
    }
}

/// Specification for creating a production batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
    /// Generated as `BATCH-<timestamp>-<random>` when absent.
    pub batch_number: Option<String>,
    /// Display name of what is being produced.
    pub product: String,
    pub product_type: ProductCategory,
    /// Link to a stocked product; completion credits its stock.
    pub product_id: Option<ProductId>,
    pub quantity: i64,
    pub unit: Unit,
    pub start_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A production batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    batch_number: String,
    product: String,
    product_type: ProductCategory,
    product_id: Option<ProductId>,
    quantity: i64,
    unit: Unit,
    status: BatchStatus,
    operator_id: UserId,
    operator: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    /// Percentage (0–100) of the nominal quantity actually usable.
    yield_pct: Option<u8>,
    quality_checks: QualityChecks,
    notes: Option<String>,
}

impl Batch {
    pub fn new(
        id: BatchId,
        spec: NewBatch,
        operator_id: UserId,
        operator: impl Into<String>,
    ) -> DomainResult<Self> {
        let operator = operator.into();
        if spec.product.trim().is_empty() {
            return Err(DomainError::validation("product cannot be empty"));
        }
        if spec.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if operator.trim().is_empty() {
            return Err(DomainError::validation("operator cannot be empty"));
        }

        let batch_number = match spec.batch_number {
            Some(n) if !n.trim().is_empty() => n,
            _ => generate_batch_number(spec.start_time),
        };

        Ok(Self {
            id,
            batch_number,
            product: spec.product,
            product_type: spec.product_type,
            product_id: spec.product_id,
            quantity: spec.quantity,
            unit: spec.unit,
            status: BatchStatus::Pending,
            operator_id,
            operator,
            start_time: spec.start_time,
            end_time: None,
            yield_pct: None,
            quality_checks: QualityChecks::default(),
            notes: spec.notes,
        })
    }

    pub fn id_typed(&self) -> BatchId {
        self.id
    }

    pub fn batch_number(&self) -> &str {
        &self.batch_number
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn product_type(&self) -> ProductCategory {
        self.product_type
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn operator_id(&self) -> UserId {
        self.operator_id
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn yield_pct(&self) -> Option<u8> {
        self.yield_pct
    }

    pub fn quality_checks(&self) -> QualityChecks {
        self.quality_checks
    }

    /// Move from `pending` to `in-progress`.
    pub fn start(&mut self) -> DomainResult<()> {
        if self.status != BatchStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "batch {} cannot start from {:?}",
                self.batch_number, self.status
            )));
        }
        self.status = BatchStatus::InProgress;
        Ok(())
    }

    /// Merge quality-check results; allowed in any non-terminal state.
    pub fn record_quality_checks(&mut self, update: QualityCheckUpdate) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "batch {} is {:?}; quality checks are frozen",
                self.batch_number, self.status
            )));
        }
        self.quality_checks.merge(update);
        Ok(())
    }

    /// Complete the batch.
    ///
    /// Returns the stock credit this completion earns: `quantity × yield /
    /// 100` against the linked product. The terminal-state guard is what
    /// makes the credit happen exactly once — a second `complete` call is
    /// rejected before any stock math runs.
    pub fn complete(
        &mut self,
        yield_pct: Option<u8>,
        checks: Option<QualityCheckUpdate>,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<(ProductId, i64)>> {
        self.ensure_not_terminal("complete")?;

        if let Some(pct) = yield_pct {
            if pct > 100 {
                return Err(DomainError::validation("yield must be between 0 and 100"));
            }
            self.yield_pct = Some(pct);
        }
        if let Some(update) = checks {
            self.quality_checks.merge(update);
        }

        self.status = BatchStatus::Completed;
        self.end_time = Some(now);

        let produced = self.quantity * i64::from(self.yield_pct.unwrap_or(0)) / 100;
        Ok(match self.product_id {
            Some(product_id) if produced > 0 => Some((product_id, produced)),
            _ => None,
        })
    }

    /// Mark the batch failed. No stock effect.
    pub fn fail(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_not_terminal("fail")?;
        self.status = BatchStatus::Failed;
        self.end_time = Some(now);
        Ok(())
    }

    /// Cancel the batch. No stock effect.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_not_terminal("cancel")?;
        self.status = BatchStatus::Cancelled;
        self.end_time = Some(now);
        Ok(())
    }

    fn ensure_not_terminal(&self, action: &str) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action} batch {} from terminal state {:?}",
                self.batch_number, self.status
            )));
        }
        Ok(())
    }
}

impl Entity for Batch {
    type Id = BatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Generate a batch number: `BATCH-<timestamp-ms>-<random suffix>`.
fn generate_batch_number(start_time: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "BATCH-{}-{}",
        start_time.timestamp_millis(),
        suffix[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yogurt_batch(quantity: i64, product_id: Option<ProductId>) -> Batch {
        Batch::new(
            BatchId::new(),
            NewBatch {
                batch_number: None,
                product: "Plain Yogurt".to_string(),
                product_type: ProductCategory::Yogurt,
                product_id,
                quantity,
                unit: Unit::Liters,
                start_time: Utc::now(),
                notes: None,
            },
            UserId::new(),
            "Marie",
        )
        .unwrap()
    }

    #[test]
    fn new_batch_gets_generated_number_and_pending_checks() {
        let batch = yogurt_batch(500, None);
        assert!(batch.batch_number().starts_with("BATCH-"));
        assert_eq!(batch.status(), BatchStatus::Pending);
        assert_eq!(batch.quality_checks(), QualityChecks::default());
        assert_eq!(batch.quality_checks().temperature, CheckResult::Pending);
    }

    #[test]
    fn explicit_batch_number_is_kept() {
        let batch = Batch::new(
            BatchId::new(),
            NewBatch {
                batch_number: Some("BATCH-CUSTOM-1".to_string()),
                product: "Brie".to_string(),
                product_type: ProductCategory::Cheese,
                product_id: None,
                quantity: 40,
                unit: Unit::Kilograms,
                start_time: Utc::now(),
                notes: None,
            },
            UserId::new(),
            "Luc",
        )
        .unwrap();
        assert_eq!(batch.batch_number(), "BATCH-CUSTOM-1");
    }

    #[test]
    fn rejects_nonpositive_quantity() {
        let err = Batch::new(
            BatchId::new(),
            NewBatch {
                batch_number: None,
                product: "Cream".to_string(),
                product_type: ProductCategory::Cream,
                product_id: None,
                quantity: 0,
                unit: Unit::Liters,
                start_time: Utc::now(),
                notes: None,
            },
            UserId::new(),
            "Luc",
        )
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn complete_computes_yield_credit() {
        let product_id = ProductId::new();
        let mut batch = yogurt_batch(500, Some(product_id));
        batch.start().unwrap();

        let credit = batch.complete(Some(90), None, Utc::now()).unwrap();
        assert_eq!(credit, Some((product_id, 450)));
        assert_eq!(batch.status(), BatchStatus::Completed);
        assert!(batch.end_time().is_some());
    }

    #[test]
    fn complete_without_product_link_credits_nothing() {
        let mut batch = yogurt_batch(500, None);
        let credit = batch.complete(Some(90), None, Utc::now()).unwrap();
        assert_eq!(credit, None);
    }

    #[test]
    fn complete_without_yield_credits_nothing() {
        let mut batch = yogurt_batch(500, Some(ProductId::new()));
        let credit = batch.complete(None, None, Utc::now()).unwrap();
        assert_eq!(credit, None);
        assert_eq!(batch.yield_pct(), None);
    }

    #[test]
    fn double_complete_is_rejected() {
        let mut batch = yogurt_batch(500, Some(ProductId::new()));
        batch.complete(Some(90), None, Utc::now()).unwrap();

        let err = batch.complete(Some(90), None, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn failed_batch_is_frozen() {
        let mut batch = yogurt_batch(200, None);
        batch.fail(Utc::now()).unwrap();

        assert!(batch.start().is_err());
        assert!(batch.cancel(Utc::now()).is_err());
        assert!(
            batch
                .record_quality_checks(QualityCheckUpdate::default())
                .is_err()
        );
    }

    #[test]
    fn quality_checks_merge_not_replace() {
        let mut batch = yogurt_batch(200, None);
        batch
            .record_quality_checks(QualityCheckUpdate {
                temperature: Some(CheckResult::Passed),
                ..Default::default()
            })
            .unwrap();
        batch
            .record_quality_checks(QualityCheckUpdate {
                ph: Some(CheckResult::Failed),
                ..Default::default()
            })
            .unwrap();

        let checks = batch.quality_checks();
        assert_eq!(checks.temperature, CheckResult::Passed);
        assert_eq!(checks.ph, CheckResult::Failed);
        assert_eq!(checks.bacteria, CheckResult::Pending);
    }

    #[test]
    fn invalid_yield_rejected_before_transition() {
        let mut batch = yogurt_batch(200, None);
        let err = batch.complete(Some(101), None, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        // Batch is still open.
        assert_eq!(batch.status(), BatchStatus::Pending);
    }
}
