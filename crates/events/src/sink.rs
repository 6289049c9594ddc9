//! Notification dispatch abstraction (mechanics only).
//!
//! Fire-and-forget: `notify` returns nothing, so a failing or slow
//! collaborator can never fail or block the mutation that triggered it.
//! Retries and backoff are the implementation's own concern.

use std::sync::Arc;

use crate::notification::Notification;

/// Outbound notification sink.
///
/// Called after a successful mutation; implementations must not panic and
/// should do their own buffering if delivery is slow.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Sink that logs notifications through `tracing`.
///
/// The default for processes without a real delivery collaborator wired in.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        tracing::info!(kind = notification.kind(), payload = ?notification, "notification emitted");
    }
}
