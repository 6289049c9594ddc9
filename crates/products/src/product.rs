use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{Cents, DomainError, DomainResult, Entity, ProductId};

/// Dairy product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Milk,
    Yogurt,
    Cheese,
    Butter,
    Cream,
    Other,
}

/// Unit a product is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "L")]
    Liters,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "units")]
    Units,
}

/// Derived stock level indicator.
///
/// Always a pure function of `(current_stock, min_threshold)`; recomputed on
/// every stock mutation, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    Normal,
    Low,
    Critical,
    OutOfStock,
}

/// Derive the stock status from current stock and the minimum threshold.
///
/// `critical` means below half the threshold (integer comparison, so the
/// boundary is exact: stock 24 with threshold 50 is critical, 25 is low).
pub fn stock_status(current_stock: i64, min_threshold: i64) -> StockStatus {
    if current_stock == 0 {
        StockStatus::OutOfStock
    } else if current_stock * 2 < min_threshold {
        StockStatus::Critical
    } else if current_stock < min_threshold {
        StockStatus::Low
    } else {
        StockStatus::Normal
    }
}

/// Specification for registering a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: ProductCategory,
    pub unit: Unit,
    pub unit_price: Cents,
    pub cost_price: Cents,
    pub initial_stock: i64,
    pub min_threshold: i64,
    pub max_capacity: i64,
    pub description: Option<String>,
    pub shelf_life_days: Option<u32>,
}

/// A product and its stock position.
///
/// Owned exclusively by the stock ledger: every mutation goes through
/// [`reserve`](Product::reserve) / [`release`](Product::release) /
/// [`credit`](Product::credit) / [`set_stock`](Product::set_stock), each of
/// which maintains the `current_stock >= 0` invariant and recomputes
/// `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    category: ProductCategory,
    unit: Unit,
    unit_price: Cents,
    cost_price: Cents,
    current_stock: i64,
    min_threshold: i64,
    max_capacity: i64,
    status: StockStatus,
    description: Option<String>,
    shelf_life_days: Option<u32>,
    last_restocked: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(id: ProductId, spec: NewProduct) -> DomainResult<Self> {
        if spec.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if spec.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if spec.initial_stock < 0 {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }
        if spec.min_threshold < 0 {
            return Err(DomainError::validation("min threshold cannot be negative"));
        }
        if spec.max_capacity < spec.min_threshold {
            return Err(DomainError::validation(
                "max capacity cannot be below min threshold",
            ));
        }

        let status = stock_status(spec.initial_stock, spec.min_threshold);
        Ok(Self {
            id,
            sku: spec.sku,
            name: spec.name,
            category: spec.category,
            unit: spec.unit,
            unit_price: spec.unit_price,
            cost_price: spec.cost_price,
            current_stock: spec.initial_stock,
            min_threshold: spec.min_threshold,
            max_capacity: spec.max_capacity,
            status,
            description: spec.description,
            shelf_life_days: spec.shelf_life_days,
            last_restocked: None,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn unit_price(&self) -> Cents {
        self.unit_price
    }

    pub fn cost_price(&self) -> Cents {
        self.cost_price
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    pub fn min_threshold(&self) -> i64 {
        self.min_threshold
    }

    pub fn max_capacity(&self) -> i64 {
        self.max_capacity
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    pub fn shelf_life_days(&self) -> Option<u32> {
        self.shelf_life_days
    }

    pub fn last_restocked(&self) -> Option<DateTime<Utc>> {
        self.last_restocked
    }

    /// Decrement stock for an order line.
    ///
    /// Fails with `InsufficientStock` when the full quantity is not
    /// available; partial reservations are never made.
    pub fn reserve(&mut self, quantity: i64) -> DomainResult<()> {
        ensure_positive(quantity)?;
        if self.current_stock < quantity {
            return Err(DomainError::insufficient_stock(
                quantity,
                self.current_stock,
            ));
        }
        self.current_stock -= quantity;
        self.recompute_status();
        Ok(())
    }

    /// Reversal of a prior reserve (order cancellation).
    pub fn release(&mut self, quantity: i64) -> DomainResult<()> {
        ensure_positive(quantity)?;
        self.current_stock += quantity;
        self.recompute_status();
        Ok(())
    }

    /// Increment stock from production or a manual restock.
    pub fn credit(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        ensure_positive(quantity)?;
        self.current_stock += quantity;
        self.last_restocked = Some(now);
        self.recompute_status();
        Ok(())
    }

    /// Administrative override of the absolute stock level.
    pub fn set_stock(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        self.current_stock = quantity;
        self.recompute_status();
        Ok(())
    }

    fn recompute_status(&mut self) {
        self.status = stock_status(self.current_stock, self.min_threshold);
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn ensure_positive(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}
