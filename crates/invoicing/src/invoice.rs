use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{
    Cents, ClientId, DomainError, DomainResult, Entity, InvoiceId, OrderId, ProductId, UserId,
    line_total, tax_on,
};
use creamery_orders::{Order, OrderStatus};

use crate::policy::{InitialStatus, IssuePolicy};

/// Invoice lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

/// An invoice line with amounts frozen at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub product_id: Option<ProductId>,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Cents,
    pub total: Cents,
}

impl creamery_core::ValueObject for InvoiceItem {}

/// Input for an ad-hoc (not order-backed) invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    /// Generated as `INV-<timestamp>-<random>` when absent.
    pub invoice_number: Option<String>,
    pub client_id: ClientId,
    pub client_name: String,
    pub items: Vec<NewInvoiceLine>,
    pub discount: Cents,
    pub notes: Option<String>,
    pub terms_and_conditions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoiceLine {
    pub product_id: Option<ProductId>,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

/// An invoice.
///
/// `subtotal`, `tax`, `discount` and `total` are computed once at issue
/// time; `total = subtotal + tax - discount` holds for the life of the
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    invoice_number: String,
    order_id: Option<OrderId>,
    client_id: ClientId,
    client_name: String,
    items: Vec<InvoiceItem>,
    status: InvoiceStatus,
    subtotal: Cents,
    tax: Cents,
    discount: Cents,
    total: Cents,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    paid_at: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    payment_reference: Option<String>,
    notes: Option<String>,
    terms_and_conditions: Option<String>,
    created_by: UserId,
}

impl Invoice {
    /// Issue an invoice from an order, snapshotting its lines and totals.
    pub fn from_order(
        id: InvoiceId,
        order: &Order,
        policy: IssuePolicy,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if order.status() == OrderStatus::Cancelled {
            return Err(DomainError::invalid_transition(format!(
                "order {} is cancelled and cannot be invoiced",
                order.order_number()
            )));
        }

        let items = order
            .items()
            .iter()
            .map(|line| InvoiceItem {
                product_id: Some(line.product_id),
                description: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                total: line.total,
            })
            .collect();

        Self::issue(IssueInputs {
            id,
            invoice_number: None,
            order_id: Some(order.id_typed()),
            client_id: order.client_id(),
            client_name: order.client_name().to_string(),
            items,
            subtotal: order.subtotal(),
            tax: order.tax(),
            discount: 0,
            notes: None,
            terms_and_conditions: None,
            created_by,
            policy,
            now,
        })
    }

    /// Issue an ad-hoc invoice from explicit lines.
    pub fn new(
        id: InvoiceId,
        spec: NewInvoice,
        policy: IssuePolicy,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if spec.client_name.trim().is_empty() {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        if spec.items.is_empty() {
            return Err(DomainError::validation(
                "invoice must contain at least one line",
            ));
        }

        let mut items = Vec::with_capacity(spec.items.len());
        let mut subtotal: Cents = 0;
        for line in spec.items {
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "quantity for {} must be positive",
                    line.description
                )));
            }
            let total = line_total(line.unit_price, line.quantity);
            subtotal += total;
            items.push(InvoiceItem {
                product_id: line.product_id,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total,
            });
        }

        Self::issue(IssueInputs {
            id,
            invoice_number: spec.invoice_number,
            order_id: None,
            client_id: spec.client_id,
            client_name: spec.client_name,
            items,
            subtotal,
            tax: tax_on(subtotal),
            discount: spec.discount,
            notes: spec.notes,
            terms_and_conditions: spec.terms_and_conditions,
            created_by,
            policy,
            now,
        })
    }

    fn issue(inputs: IssueInputs) -> DomainResult<Self> {
        if inputs.discount > inputs.subtotal + inputs.tax {
            return Err(DomainError::validation(
                "discount cannot exceed subtotal plus tax",
            ));
        }

        let invoice_number = match inputs.invoice_number {
            Some(n) if !n.trim().is_empty() => n,
            _ => generate_invoice_number(inputs.now),
        };
        let issue_date = inputs.now.date_naive();
        let due_date = issue_date
            .checked_add_days(Days::new(u64::from(inputs.policy.payment_terms_days)))
            .ok_or_else(|| DomainError::validation("payment terms overflow the calendar"))?;
        let status = match inputs.policy.initial_status {
            InitialStatus::Draft => InvoiceStatus::Draft,
            InitialStatus::Sent => InvoiceStatus::Sent,
        };

        Ok(Self {
            id: inputs.id,
            invoice_number,
            order_id: inputs.order_id,
            client_id: inputs.client_id,
            client_name: inputs.client_name,
            items: inputs.items,
            status,
            subtotal: inputs.subtotal,
            tax: inputs.tax,
            discount: inputs.discount,
            total: inputs.subtotal + inputs.tax - inputs.discount,
            issue_date,
            due_date,
            paid_at: None,
            payment_method: None,
            payment_reference: None,
            notes: inputs.notes,
            terms_and_conditions: inputs.terms_and_conditions,
            created_by: inputs.created_by,
        })
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn subtotal(&self) -> Cents {
        self.subtotal
    }

    pub fn tax(&self) -> Cents {
        self.tax
    }

    pub fn discount(&self) -> Cents {
        self.discount
    }

    pub fn total(&self) -> Cents {
        self.total
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Send a draft invoice to the client.
    pub fn mark_sent(&mut self) -> DomainResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(self.bad_transition("send"));
        }
        self.status = InvoiceStatus::Sent;
        Ok(())
    }

    /// Record payment. Allowed from `sent` or `overdue`.
    pub fn mark_paid(
        &mut self,
        now: DateTime<Utc>,
        method: Option<String>,
        reference: Option<String>,
    ) -> DomainResult<()> {
        if !matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Overdue) {
            return Err(self.bad_transition("pay"));
        }
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(now);
        self.payment_method = method;
        self.payment_reference = reference;
        Ok(())
    }

    /// Flag a sent invoice past its due date as overdue.
    ///
    /// Idempotent: an already-overdue invoice reports `false` and is left
    /// unchanged, so sweeps can run repeatedly. Returns `true` when this
    /// call performed the transition.
    pub fn mark_overdue(&mut self, today: NaiveDate) -> DomainResult<bool> {
        match self.status {
            InvoiceStatus::Overdue => Ok(false),
            InvoiceStatus::Sent => {
                if today <= self.due_date {
                    return Err(DomainError::invalid_transition(format!(
                        "invoice {} is not due until {}",
                        self.invoice_number, self.due_date
                    )));
                }
                self.status = InvoiceStatus::Overdue;
                Ok(true)
            }
            _ => Err(self.bad_transition("mark overdue")),
        }
    }

    /// Void an unpaid invoice.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(self.bad_transition("cancel"));
        }
        self.status = InvoiceStatus::Cancelled;
        Ok(())
    }

    fn bad_transition(&self, action: &str) -> DomainError {
        DomainError::invalid_transition(format!(
            "cannot {action} invoice {} in state {:?}",
            self.invoice_number, self.status
        ))
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

struct IssueInputs {
    id: InvoiceId,
    invoice_number: Option<String>,
    order_id: Option<OrderId>,
    client_id: ClientId,
    client_name: String,
    items: Vec<InvoiceItem>,
    subtotal: Cents,
    tax: Cents,
    discount: Cents,
    notes: Option<String>,
    terms_and_conditions: Option<String>,
    created_by: UserId,
    policy: IssuePolicy,
    now: DateTime<Utc>,
}

/// Generate an invoice number: `INV-<timestamp-ms>-<random suffix>`.
fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "INV-{}-{}",
        now.timestamp_millis(),
        suffix[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use creamery_orders::{NewOrder, NewOrderItem};

    fn delivered_order() -> Order {
        let mut order = Order::new(
            OrderId::new(),
            NewOrder {
                order_number: None,
                client_id: ClientId::new(),
                client_name: "Fromagerie Dupont".to_string(),
                items: vec![
                    NewOrderItem {
                        product_id: ProductId::new(),
                        product_name: "Whole Milk".to_string(),
                        quantity: 60,
                        unit_price: 120,
                    },
                    NewOrderItem {
                        product_id: ProductId::new(),
                        product_name: "Butter".to_string(),
                        quantity: 20,
                        unit_price: 685,
                    },
                ],
                delivery_date: None,
                delivery_address: None,
                special_instructions: None,
                created_by: UserId::new(),
            },
            Utc::now(),
        )
        .unwrap();
        order
            .update_status(OrderStatus::Delivered, Utc::now(), None, None)
            .unwrap();
        order
    }

    fn ad_hoc(discount: Cents, unit_price: Cents) -> DomainResult<Invoice> {
        Invoice::new(
            InvoiceId::new(),
            NewInvoice {
                invoice_number: Some("INV-TEST-1".to_string()),
                client_id: ClientId::new(),
                client_name: "Café Lune".to_string(),
                items: vec![NewInvoiceLine {
                    product_id: None,
                    description: "Delivery surcharge".to_string(),
                    quantity: 1,
                    unit_price,
                }],
                discount,
                notes: None,
                terms_and_conditions: Some("Net 30".to_string()),
            },
            IssuePolicy::default(),
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn from_order_snapshots_totals_and_due_date() {
        let order = delivered_order();
        let now = Utc::now();
        let accountant = UserId::new();
        let invoice =
            Invoice::from_order(InvoiceId::new(), &order, IssuePolicy::default(), accountant, now)
                .unwrap();

        assert_eq!(invoice.subtotal(), 20900);
        assert_eq!(invoice.tax(), 4180);
        assert_eq!(invoice.discount(), 0);
        assert_eq!(invoice.total(), 25080);
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.order_id(), Some(order.id_typed()));
        assert_eq!(invoice.created_by(), accountant);
        assert_eq!(
            invoice.due_date(),
            now.date_naive().checked_add_days(Days::new(30)).unwrap()
        );
        assert!(invoice.invoice_number().starts_with("INV-"));
    }

    #[test]
    fn cancelled_order_cannot_be_invoiced() {
        let mut order = Order::new(
            OrderId::new(),
            NewOrder {
                order_number: None,
                client_id: ClientId::new(),
                client_name: "Café Lune".to_string(),
                items: vec![NewOrderItem {
                    product_id: ProductId::new(),
                    product_name: "Cream".to_string(),
                    quantity: 5,
                    unit_price: 300,
                }],
                delivery_date: None,
                delivery_address: None,
                special_instructions: None,
                created_by: UserId::new(),
            },
            Utc::now(),
        )
        .unwrap();
        order.cancel(Utc::now(), None, None).unwrap();

        let err = Invoice::from_order(
            InvoiceId::new(),
            &order,
            IssuePolicy::default(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn ad_hoc_invoice_applies_discount() {
        let invoice = ad_hoc(2000, 10000).unwrap();
        assert_eq!(invoice.subtotal(), 10000);
        assert_eq!(invoice.tax(), 2000);
        assert_eq!(invoice.total(), 10000);
        assert_eq!(invoice.invoice_number(), "INV-TEST-1");
    }

    #[test]
    fn discount_cannot_exceed_amount_owed() {
        let err = ad_hoc(1000, 100).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn lifecycle_draft_sent_paid() {
        let order = delivered_order();
        let mut invoice = Invoice::from_order(
            InvoiceId::new(),
            &order,
            IssuePolicy::default(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();

        // Draft cannot be paid directly.
        assert!(invoice.mark_paid(Utc::now(), None, None).is_err());

        invoice.mark_sent().unwrap();
        assert!(invoice.mark_sent().is_err());

        invoice
            .mark_paid(
                Utc::now(),
                Some("bank transfer".to_string()),
                Some("TRX-4412".to_string()),
            )
            .unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert!(invoice.paid_at().is_some());
        assert_eq!(invoice.payment_method(), Some("bank transfer"));
        assert_eq!(invoice.payment_reference(), Some("TRX-4412"));

        // Paid is terminal.
        assert!(invoice.cancel().is_err());
    }

    #[test]
    fn overdue_is_idempotent_and_still_payable() {
        let order = delivered_order();
        let policy = IssuePolicy {
            payment_terms_days: 30,
            initial_status: InitialStatus::Sent,
        };
        let mut invoice =
            Invoice::from_order(InvoiceId::new(), &order, policy, UserId::new(), Utc::now())
                .unwrap();

        let before_due = invoice.due_date();
        assert!(invoice.mark_overdue(before_due).is_err());

        let after_due = before_due.checked_add_days(Days::new(1)).unwrap();
        assert!(invoice.mark_overdue(after_due).unwrap());
        assert!(!invoice.mark_overdue(after_due).unwrap());
        assert_eq!(invoice.status(), InvoiceStatus::Overdue);

        invoice.mark_paid(Utc::now(), None, None).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn unpaid_invoice_can_be_cancelled() {
        let order = delivered_order();
        let mut invoice = Invoice::from_order(
            InvoiceId::new(),
            &order,
            IssuePolicy::default(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        invoice.cancel().unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Cancelled);
        assert!(invoice.mark_sent().is_err());
    }
}
