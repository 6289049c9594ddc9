//! Store collection names.
//!
//! One collection per aggregate; constants so services and jobs can never
//! drift apart on spelling.

pub const PRODUCTS: &str = "products";
pub const BATCHES: &str = "batches";
pub const ORDERS: &str = "orders";
pub const INVOICES: &str = "invoices";
pub const CLIENTS: &str = "clients";
