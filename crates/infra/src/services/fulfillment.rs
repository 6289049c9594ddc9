use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use creamery_auth::{Principal, Role};
use creamery_core::{ClientId, DomainError, DomainResult, OrderId, ProductId};
use creamery_events::{Notification, NotificationSink};
use creamery_orders::{NewOrder, NewOrderItem, Order, OrderStatus};
use creamery_products::Product;
use creamery_store::{RecordWrite, TxStore};

use crate::collections;
use crate::services::{ClientLedger, StockLedger, load, load_all, with_retry};

/// One requested order line. Prices are not part of the request; they are
/// snapshotted from the product at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_id: ClientId,
    pub lines: Vec<OrderLine>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
}

/// Coordinates orders against stock, clients and notifications.
#[derive(Debug, Clone)]
pub struct FulfillmentService<S, N> {
    store: S,
    ledger: StockLedger<S, N>,
    clients: ClientLedger<S>,
    sink: N,
}

impl<S, N> FulfillmentService<S, N>
where
    S: TxStore + Clone,
    N: NotificationSink + Clone,
{
    pub fn new(store: S, sink: N) -> Self {
        Self {
            ledger: StockLedger::new(store.clone(), sink.clone()),
            clients: ClientLedger::new(store.clone()),
            store,
            sink,
        }
    }

    /// Place an order.
    ///
    /// Stock is reserved line by line; if any line cannot be reserved, every
    /// reservation made so far is released and the whole request fails with
    /// the offending line's error. The client statistics bump afterwards is
    /// best-effort: a failure there is logged, never rolled back, because
    /// the counters can always be rebuilt from orders.
    pub fn create_order(&self, request: OrderRequest, actor: &Principal) -> DomainResult<Order> {
        let client = self.clients.get(request.client_id)?;
        if request.lines.is_empty() {
            return Err(DomainError::validation(
                "order must contain at least one item",
            ));
        }

        let mut reserved: Vec<(ProductId, i64)> = Vec::with_capacity(request.lines.len());
        let mut items = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = match self.ledger.reserve(line.product_id, line.quantity) {
                Ok(product) => product,
                Err(err) => {
                    self.release_reserved(&reserved);
                    return Err(err);
                }
            };
            reserved.push((line.product_id, line.quantity));
            items.push(NewOrderItem {
                product_id: line.product_id,
                product_name: product.name().to_string(),
                quantity: line.quantity,
                unit_price: product.unit_price(),
            });
        }

        let now = Utc::now();
        let order = Order::new(
            OrderId::new(),
            NewOrder {
                order_number: None,
                client_id: request.client_id,
                client_name: client.name().to_string(),
                items,
                delivery_date: request.delivery_date,
                delivery_address: request.delivery_address,
                special_instructions: request.special_instructions,
                created_by: actor.user_id,
            },
            now,
        )
        .and_then(|order| {
            self.store.commit(vec![RecordWrite::insert(
                collections::ORDERS,
                order.id_typed(),
                &order,
            )?])?;
            Ok(order)
        });
        let order = match order {
            Ok(order) => order,
            Err(err) => {
                self.release_reserved(&reserved);
                return Err(err);
            }
        };

        if let Err(err) = self.clients.bump(request.client_id, order.total(), now) {
            tracing::warn!(
                order_number = order.order_number(),
                client_id = %request.client_id,
                error = %err,
                "client statistics bump failed; counters can be rebuilt"
            );
        }

        self.sink.notify(Notification::OrderConfirmed {
            order_id: order.id_typed(),
            order_number: order.order_number().to_string(),
            client_name: order.client_name().to_string(),
            total: order.total(),
        });
        tracing::info!(
            order_number = order.order_number(),
            total = order.total(),
            created_by = %actor.name,
            "order created"
        );
        Ok(order)
    }

    pub fn get(&self, id: OrderId) -> DomainResult<Order> {
        let (order, _) = load(&self.store, collections::ORDERS, id)?;
        Ok(order)
    }

    pub fn list(&self) -> DomainResult<Vec<Order>> {
        load_all(&self.store, collections::ORDERS)
    }

    /// Move an order forward along the delivery pipeline.
    pub fn update_status(
        &self,
        id: OrderId,
        to: OrderStatus,
        note: Option<String>,
        actor: &Principal,
    ) -> DomainResult<Order> {
        with_retry(|| {
            let (mut order, version): (Order, u64) = load(&self.store, collections::ORDERS, id)?;
            order.update_status(to, Utc::now(), note.clone(), Some(actor.user_id))?;
            self.store.commit(vec![RecordWrite::update(
                collections::ORDERS,
                id,
                version,
                &order,
            )?])?;
            Ok(order)
        })
    }

    /// Assign a driver to an order. The assignee must hold the driver role.
    pub fn assign_driver(&self, id: OrderId, driver: &Principal) -> DomainResult<Order> {
        if driver.role != Role::driver() {
            return Err(DomainError::validation(format!(
                "{} does not hold the driver role",
                driver.name
            )));
        }
        with_retry(|| {
            let (mut order, version): (Order, u64) = load(&self.store, collections::ORDERS, id)?;
            order.assign_driver(driver.user_id, driver.name.clone())?;
            self.store.commit(vec![RecordWrite::update(
                collections::ORDERS,
                id,
                version,
                &order,
            )?])?;
            Ok(order)
        })
    }

    /// Cancel an order and restore its stock.
    ///
    /// The order update and every stock release land in one atomic commit,
    /// so a cancelled order can never be observed with its stock still
    /// reserved.
    pub fn cancel(
        &self,
        id: OrderId,
        reason: Option<String>,
        actor: &Principal,
    ) -> DomainResult<Order> {
        with_retry(|| {
            let (mut order, version): (Order, u64) = load(&self.store, collections::ORDERS, id)?;
            order.cancel(Utc::now(), reason.clone(), Some(actor.user_id))?;

            let mut writes = vec![RecordWrite::update(
                collections::ORDERS,
                id,
                version,
                &order,
            )?];
            for item in order.items() {
                let (mut product, product_version): (Product, u64) =
                    load(&self.store, collections::PRODUCTS, item.product_id)?;
                product.release(item.quantity)?;
                writes.push(RecordWrite::update(
                    collections::PRODUCTS,
                    item.product_id,
                    product_version,
                    &product,
                )?);
            }
            self.store.commit(writes)?;
            tracing::info!(order_number = order.order_number(), "order cancelled");
            Ok(order)
        })
    }

    fn release_reserved(&self, reserved: &[(ProductId, i64)]) {
        for &(product_id, quantity) in reserved {
            if let Err(err) = self.ledger.release(product_id, quantity) {
                tracing::error!(
                    product_id = %product_id,
                    quantity,
                    error = %err,
                    "compensating release failed; stock requires manual correction"
                );
            }
        }
    }
}
