//! `creamery-events` — outbound notifications.
//!
//! The core emits notifications after successful mutations (order confirmed,
//! low stock, payment due, ...). Delivery (email, push, webhooks) is an
//! external collaborator: the sink is fire-and-forget and must never block or
//! fail the triggering operation.

pub mod in_memory;
pub mod notification;
pub mod sink;

pub use in_memory::RecordingSink;
pub use notification::{Notification, ProductionReport, ProductionReportLine};
pub use sink::{LogSink, NotificationSink};
