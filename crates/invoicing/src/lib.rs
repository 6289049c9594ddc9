//! Invoicing domain module.
//!
//! Invoices snapshot their amounts at issue time, either from an order or
//! from ad-hoc lines. Status machine: `draft → sent → {paid | overdue}`,
//! with `overdue → paid` for late payment and `cancelled` reachable from
//! any unpaid state.

pub mod invoice;
pub mod policy;

pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, NewInvoice, NewInvoiceLine};
pub use policy::{InitialStatus, IssuePolicy};
