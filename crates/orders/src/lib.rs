//! Orders domain module.
//!
//! An order snapshots its line prices at creation and carries an
//! append-only tracking log. The status machine only moves forward along
//! the delivery pipeline; cancellation is a separate operation with its
//! own rules.

pub mod order;
pub mod tracking;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
pub use tracking::TrackingEvent;
