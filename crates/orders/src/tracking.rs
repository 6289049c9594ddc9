use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{UserId, ValueObject};

use crate::order::OrderStatus;

/// One entry in an order's tracking log.
///
/// The log is append-only; entries are never edited or removed, so it is a
/// faithful history of every status the order passed through and who moved
/// it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
    pub location: Option<String>,
    pub updated_by: Option<UserId>,
}

impl TrackingEvent {
    pub fn new(
        status: OrderStatus,
        timestamp: DateTime<Utc>,
        note: Option<String>,
        updated_by: Option<UserId>,
    ) -> Self {
        Self {
            status,
            timestamp,
            note,
            location: None,
            updated_by,
        }
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl ValueObject for TrackingEvent {}
