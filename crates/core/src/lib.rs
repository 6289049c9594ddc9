//! `creamery-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BatchId, ClientId, InvoiceId, OrderId, ProductId, UserId};
pub use money::{Cents, line_total, tax_on};
pub use value_object::ValueObject;
