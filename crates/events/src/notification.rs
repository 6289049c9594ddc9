use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{BatchId, Cents, InvoiceId, OrderId, ProductId};

/// One product line of a daily production report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionReportLine {
    pub product_name: String,
    pub quantity: i64,
}

/// Aggregated production figures for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionReport {
    pub date: NaiveDate,
    pub total_production: i64,
    pub batches_completed: usize,
    pub production_by_product: Vec<ProductionReportLine>,
    pub active_operators: usize,
}

/// Outbound notification payloads (closed set).
///
/// Each variant corresponds to one delivery template on the collaborator
/// side. Payloads are snapshots: they carry everything the template needs so
/// the sink never reads back into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notification {
    OrderConfirmed {
        order_id: OrderId,
        order_number: String,
        client_name: String,
        total: Cents,
    },
    LowStock {
        product_id: ProductId,
        product_name: String,
        current_stock: i64,
        min_threshold: i64,
    },
    BatchExpiring {
        batch_id: BatchId,
        batch_number: String,
        product: String,
        expires_on: DateTime<Utc>,
    },
    PaymentDue {
        invoice_id: InvoiceId,
        invoice_number: String,
        client_name: String,
        total: Cents,
        due_date: DateTime<Utc>,
    },
    ProductionReport(ProductionReport),
}

impl Notification {
    /// Stable kind string, used for routing and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OrderConfirmed { .. } => "order-confirmed",
            Notification::LowStock { .. } => "low-stock",
            Notification::BatchExpiring { .. } => "batch-expiring",
            Notification::PaymentDue { .. } => "payment-due",
            Notification::ProductionReport(_) => "production-report",
        }
    }
}
