use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{
    Cents, ClientId, DomainError, DomainResult, Entity, OrderId, ProductId, UserId, line_total,
    tax_on,
};

use crate::tracking::TrackingEvent;

/// Order lifecycle state.
///
/// The delivery pipeline is strictly ordered; [`Order::update_status`] only
/// moves forward along it. `Cancelled` is reachable from any non-terminal
/// state, but only through [`Order::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    // Older records used "processing" for this stage.
    #[serde(alias = "processing")]
    Preparing,
    Ready,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position in the delivery pipeline. `Cancelled` has no position.
    fn pipeline_rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::InTransit => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }
}

/// Input line for a new order; prices are snapshotted from the product at
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

/// An order line with its price frozen at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Cents,
    pub total: Cents,
}

impl creamery_core::ValueObject for OrderItem {}

/// Specification for placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Generated as `ORD-<timestamp>-<random>` when absent.
    pub order_number: Option<String>,
    pub client_id: ClientId,
    pub client_name: String,
    pub items: Vec<NewOrderItem>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_by: UserId,
}

/// A client order.
///
/// Item prices and the subtotal/tax/total triple are computed once at
/// creation and never recomputed, so later product price changes cannot
/// retroactively change what the client owes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: String,
    client_id: ClientId,
    client_name: String,
    items: Vec<OrderItem>,
    status: OrderStatus,
    subtotal: Cents,
    tax: Cents,
    total: Cents,
    delivery_date: Option<NaiveDate>,
    delivery_address: Option<String>,
    driver_id: Option<UserId>,
    driver_name: Option<String>,
    special_instructions: Option<String>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    tracking: Vec<TrackingEvent>,
}

impl Order {
    pub fn new(id: OrderId, spec: NewOrder, now: DateTime<Utc>) -> DomainResult<Self> {
        if spec.client_name.trim().is_empty() {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        if spec.items.is_empty() {
            return Err(DomainError::validation(
                "order must contain at least one item",
            ));
        }

        let mut items = Vec::with_capacity(spec.items.len());
        let mut subtotal: Cents = 0;
        for line in spec.items {
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "quantity for {} must be positive",
                    line.product_name
                )));
            }
            let total = line_total(line.unit_price, line.quantity);
            subtotal += total;
            items.push(OrderItem {
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total,
            });
        }

        let tax = tax_on(subtotal);
        let order_number = match spec.order_number {
            Some(n) if !n.trim().is_empty() => n,
            _ => generate_order_number(now),
        };

        Ok(Self {
            id,
            order_number,
            client_id: spec.client_id,
            client_name: spec.client_name,
            items,
            status: OrderStatus::Pending,
            subtotal,
            tax,
            total: subtotal + tax,
            delivery_date: spec.delivery_date,
            delivery_address: spec.delivery_address,
            driver_id: None,
            driver_name: None,
            special_instructions: spec.special_instructions,
            created_by: spec.created_by,
            created_at: now,
            tracking: vec![TrackingEvent::new(
                OrderStatus::Pending,
                now,
                Some("Order created".to_string()),
                Some(spec.created_by),
            )],
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn subtotal(&self) -> Cents {
        self.subtotal
    }

    pub fn tax(&self) -> Cents {
        self.tax
    }

    pub fn total(&self) -> Cents {
        self.total
    }

    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.delivery_date
    }

    pub fn delivery_address(&self) -> Option<&str> {
        self.delivery_address.as_deref()
    }

    pub fn driver_id(&self) -> Option<UserId> {
        self.driver_id
    }

    pub fn driver_name(&self) -> Option<&str> {
        self.driver_name.as_deref()
    }

    pub fn special_instructions(&self) -> Option<&str> {
        self.special_instructions.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn tracking(&self) -> &[TrackingEvent] {
        &self.tracking
    }

    /// Move the order forward along the delivery pipeline.
    ///
    /// Backward moves, self-moves, moves out of a terminal state, and moves
    /// to `Cancelled` are all rejected. Use [`Order::cancel`] to cancel.
    pub fn update_status(
        &mut self,
        to: OrderStatus,
        now: DateTime<Utc>,
        note: Option<String>,
        updated_by: Option<UserId>,
    ) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "order {} is {:?} and cannot change status",
                self.order_number, self.status
            )));
        }
        let (Some(from_rank), Some(to_rank)) = (self.status.pipeline_rank(), to.pipeline_rank())
        else {
            return Err(DomainError::invalid_transition(
                "cancellation must go through the cancel operation",
            ));
        };
        if to_rank <= from_rank {
            return Err(DomainError::invalid_transition(format!(
                "order {} cannot move from {:?} to {:?}",
                self.order_number, self.status, to
            )));
        }

        self.status = to;
        self.tracking
            .push(TrackingEvent::new(to, now, note, updated_by));
        Ok(())
    }

    /// Cancel the order. Allowed from any non-terminal state.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
        reason: Option<String>,
        cancelled_by: Option<UserId>,
    ) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "order {} is {:?} and cannot be cancelled",
                self.order_number, self.status
            )));
        }
        self.status = OrderStatus::Cancelled;
        self.tracking.push(TrackingEvent::new(
            OrderStatus::Cancelled,
            now,
            reason,
            cancelled_by,
        ));
        Ok(())
    }

    /// Assign (or reassign) the delivery driver.
    pub fn assign_driver(
        &mut self,
        driver_id: UserId,
        driver_name: impl Into<String>,
    ) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "order {} is {:?}; driver cannot be assigned",
                self.order_number, self.status
            )));
        }
        self.driver_id = Some(driver_id);
        self.driver_name = Some(driver_name.into());
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Generate an order number: `ORD-<timestamp-ms>-<random suffix>`.
fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        now.timestamp_millis(),
        suffix[..8].to_uppercase()
    )
}
