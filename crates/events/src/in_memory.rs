//! In-memory notification sink for tests/dev.

use std::sync::Mutex;

use crate::notification::Notification;
use crate::sink::NotificationSink;

/// Sink that records every notification it receives.
///
/// - No IO / no async
/// - Never fails the caller (a poisoned lock drops the notification)
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Kinds received so far, in emission order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.all().iter().map(|n| n.kind()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}
