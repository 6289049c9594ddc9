//! Money helpers.
//!
//! All monetary amounts are integer minor units (cents). Arithmetic stays in
//! integers so totals are exact and comparable across Order and Invoice
//! snapshots.

/// Monetary amount in minor units (cents).
pub type Cents = u64;

/// Flat tax rate applied to order and invoice subtotals, in percent.
pub const TAX_RATE_PERCENT: u64 = 20;

/// Compute the flat 20% tax on a subtotal, in cents.
pub fn tax_on(subtotal: Cents) -> Cents {
    subtotal * TAX_RATE_PERCENT / 100
}

/// Line total: unit price × quantity.
///
/// Quantities are validated positive before this is called; the cast is safe
/// for any realistic order line.
pub fn line_total(unit_price: Cents, quantity: i64) -> Cents {
    unit_price * quantity as u64
}
