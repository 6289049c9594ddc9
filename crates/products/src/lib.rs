//! Products domain module.
//!
//! This crate contains business rules for products and their stock,
//! implemented purely as deterministic domain logic (no IO, no storage).
//! Stock is mutated only through the operations here; persistence and
//! concurrency control live in the service layer.

pub mod product;

pub use product::{
    NewProduct, Product, ProductCategory, StockStatus, Unit, stock_status,
};
