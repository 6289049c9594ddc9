use chrono::Utc;

use creamery_auth::{Principal, Role};
use creamery_core::{DomainError, DomainResult, ProductId};
use creamery_events::{Notification, NotificationSink};
use creamery_products::{NewProduct, Product, StockStatus};
use creamery_store::{RecordWrite, TxStore};

use crate::collections;
use crate::services::{load, load_all, with_retry};

/// Authoritative view of products and their stock.
///
/// All stock movement in the system funnels through this service, so the
/// `current_stock >= 0` invariant and the derived status are enforced in one
/// place.
#[derive(Debug, Clone)]
pub struct StockLedger<S, N> {
    store: S,
    sink: N,
}

impl<S: TxStore, N: NotificationSink> StockLedger<S, N> {
    pub fn new(store: S, sink: N) -> Self {
        Self { store, sink }
    }

    /// Register a new product.
    pub fn register(&self, spec: NewProduct) -> DomainResult<Product> {
        let product = Product::new(ProductId::new(), spec)?;
        self.store.commit(vec![RecordWrite::insert(
            collections::PRODUCTS,
            product.id_typed(),
            &product,
        )?])?;
        tracing::info!(product_id = %product.id_typed(), sku = product.sku(), "product registered");
        Ok(product)
    }

    pub fn get(&self, id: ProductId) -> DomainResult<Product> {
        let (product, _) = load(&self.store, collections::PRODUCTS, id)?;
        Ok(product)
    }

    pub fn list(&self) -> DomainResult<Vec<Product>> {
        load_all(&self.store, collections::PRODUCTS)
    }

    /// Decrement stock for an order line. All-or-nothing per product.
    pub fn reserve(&self, id: ProductId, quantity: i64) -> DomainResult<Product> {
        self.mutate(id, |product| product.reserve(quantity))
    }

    /// Reversal of a prior reserve.
    pub fn release(&self, id: ProductId, quantity: i64) -> DomainResult<Product> {
        self.mutate(id, |product| product.release(quantity))
    }

    /// Increment stock (production output or a manual restock).
    pub fn credit(&self, id: ProductId, quantity: i64) -> DomainResult<Product> {
        let now = Utc::now();
        self.mutate(id, |product| product.credit(quantity, now))
    }

    /// Administrative stock override. Admin or manager only.
    pub fn set_stock(
        &self,
        principal: &Principal,
        id: ProductId,
        quantity: i64,
    ) -> DomainResult<Product> {
        if principal.role != Role::admin() && principal.role != Role::manager() {
            return Err(DomainError::Unauthorized);
        }
        tracing::info!(product_id = %id, quantity, user = %principal.name, "stock override");
        self.mutate(id, |product| product.set_stock(quantity))
    }

    /// Build the precondition-checked write that credits production output.
    ///
    /// Used when a stock credit must land in the same atomic commit as
    /// another record (batch completion). The caller owns the commit and its
    /// retries.
    pub fn prepare_credit(&self, id: ProductId, quantity: i64) -> DomainResult<RecordWrite> {
        let (mut product, version): (Product, u64) = load(&self.store, collections::PRODUCTS, id)?;
        product.credit(quantity, Utc::now())?;
        Ok(RecordWrite::update(
            collections::PRODUCTS,
            id,
            version,
            &product,
        )?)
    }

    fn mutate(
        &self,
        id: ProductId,
        op: impl Fn(&mut Product) -> DomainResult<()>,
    ) -> DomainResult<Product> {
        let product = with_retry(|| {
            let (mut product, version): (Product, u64) =
                load(&self.store, collections::PRODUCTS, id)?;
            let before = product.status();
            op(&mut product)?;
            self.store.commit(vec![RecordWrite::update(
                collections::PRODUCTS,
                id,
                version,
                &product,
            )?])?;
            Ok((product, before))
        })
        .map(|(product, before)| {
            self.maybe_warn_low_stock(before, &product);
            product
        })?;
        Ok(product)
    }

    /// Emit a low-stock notification when a mutation drops the product out
    /// of `normal`. Re-emitting on every further movement below threshold
    /// would be noise; the periodic scan covers lingering shortages.
    fn maybe_warn_low_stock(&self, before: StockStatus, product: &Product) {
        if before == StockStatus::Normal && product.status() != StockStatus::Normal {
            self.sink.notify(Notification::LowStock {
                product_id: product.id_typed(),
                product_name: product.name().to_string(),
                current_stock: product.current_stock(),
                min_threshold: product.min_threshold(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use creamery_core::UserId;
    use creamery_events::RecordingSink;
    use creamery_products::{ProductCategory, Unit};
    use creamery_store::InMemoryStore;

    fn ledger() -> (
        StockLedger<Arc<InMemoryStore>, Arc<RecordingSink>>,
        Arc<RecordingSink>,
    ) {
        let store = Arc::new(InMemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        (StockLedger::new(store, Arc::clone(&sink)), sink)
    }

    fn milk(initial_stock: i64) -> NewProduct {
        NewProduct {
            sku: "MILK-1L".to_string(),
            name: "Whole Milk".to_string(),
            category: ProductCategory::Milk,
            unit: Unit::Liters,
            unit_price: 120,
            cost_price: 80,
            initial_stock,
            min_threshold: 50,
            max_capacity: 1000,
            description: None,
            shelf_life_days: Some(7),
        }
    }

    #[test]
    fn register_then_get_round_trips() {
        let (ledger, _) = ledger();
        let product = ledger.register(milk(100)).unwrap();
        let fetched = ledger.get(product.id_typed()).unwrap();
        assert_eq!(fetched, product);
    }

    #[test]
    fn get_unknown_product_is_not_found() {
        let (ledger, _) = ledger();
        let err = ledger.get(ProductId::new()).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn reserve_persists_and_warns_on_threshold_crossing() {
        let (ledger, sink) = ledger();
        let product = ledger.register(milk(100)).unwrap();

        let after = ledger.reserve(product.id_typed(), 60).unwrap();
        assert_eq!(after.current_stock(), 40);
        assert_eq!(after.status(), StockStatus::Low);
        assert_eq!(sink.kinds(), vec!["low-stock"]);

        // Further movement below threshold does not re-warn.
        ledger.reserve(product.id_typed(), 10).unwrap();
        assert_eq!(sink.kinds(), vec!["low-stock"]);
    }

    #[test]
    fn overdraw_is_rejected_and_changes_nothing() {
        let (ledger, sink) = ledger();
        let product = ledger.register(milk(40)).unwrap();

        let err = ledger.reserve(product.id_typed(), 41).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(ledger.get(product.id_typed()).unwrap().current_stock(), 40);
        assert!(sink.kinds().is_empty());
    }

    #[test]
    fn release_and_credit_restore_stock() {
        let (ledger, _) = ledger();
        let product = ledger.register(milk(100)).unwrap();

        ledger.reserve(product.id_typed(), 60).unwrap();
        ledger.release(product.id_typed(), 60).unwrap();
        assert_eq!(ledger.get(product.id_typed()).unwrap().current_stock(), 100);

        let credited = ledger.credit(product.id_typed(), 50).unwrap();
        assert_eq!(credited.current_stock(), 150);
        assert!(credited.last_restocked().is_some());
    }

    #[test]
    fn stock_override_requires_admin_or_manager() {
        let (ledger, _) = ledger();
        let product = ledger.register(milk(100)).unwrap();

        let operator = Principal::new(UserId::new(), "Marie", Role::operator());
        let err = ledger
            .set_stock(&operator, product.id_typed(), 10)
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");

        let manager = Principal::new(UserId::new(), "Jean", Role::manager());
        let after = ledger.set_stock(&manager, product.id_typed(), 10).unwrap();
        assert_eq!(after.current_stock(), 10);
    }

    #[test]
    fn concurrent_reserves_never_oversell() {
        let (ledger, _) = ledger();
        let product = ledger.register(milk(100)).unwrap();
        let id = product.id_typed();

        let ledger = Arc::new(ledger);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || ledger.reserve(id, 30).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count();

        // 100 units, 30 per reserve: at most 3 can win.
        assert!(successes <= 3);
        let remaining = ledger.get(id).unwrap().current_stock();
        assert_eq!(remaining, 100 - 30 * successes as i64);
        assert!(remaining >= 0);
    }
}
