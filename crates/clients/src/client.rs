use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creamery_core::{Cents, ClientId, DomainError, DomainResult, Entity};

/// Kind of business the client runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Restaurant,
    Shop,
    Hotel,
    Wholesaler,
    #[default]
    Other,
}

/// Whether the client is currently buying from us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

/// Specification for registering a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub client_type: ClientType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// A client and their denormalized purchase statistics.
///
/// `monthly_revenue` and `rating` are carried for the account managers'
/// bookkeeping; the core only maintains `total_orders`, `total_revenue` and
/// `last_order_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    id: ClientId,
    name: String,
    client_type: ClientType,
    status: ClientStatus,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    notes: Option<String>,
    total_orders: u64,
    total_revenue: Cents,
    last_order_date: Option<DateTime<Utc>>,
    monthly_revenue: Cents,
    rating: Option<u8>,
}

impl Client {
    pub fn new(id: ClientId, spec: NewClient) -> DomainResult<Self> {
        if spec.name.trim().is_empty() {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        Ok(Self {
            id,
            name: spec.name,
            client_type: spec.client_type,
            status: ClientStatus::Active,
            email: spec.email,
            phone: spec.phone,
            address: spec.address,
            notes: spec.notes,
            total_orders: 0,
            total_revenue: 0,
            last_order_date: None,
            monthly_revenue: 0,
            rating: None,
        })
    }

    pub fn id_typed(&self) -> ClientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders
    }

    pub fn total_revenue(&self) -> Cents {
        self.total_revenue
    }

    pub fn last_order_date(&self) -> Option<DateTime<Utc>> {
        self.last_order_date
    }

    pub fn monthly_revenue(&self) -> Cents {
        self.monthly_revenue
    }

    pub fn rating(&self) -> Option<u8> {
        self.rating
    }

    /// Record one more order against this client's statistics.
    pub fn bump(&mut self, order_total: Cents, placed_at: DateTime<Utc>) {
        self.total_orders += 1;
        self.total_revenue += order_total;
        if self.last_order_date.is_none_or(|prev| placed_at > prev) {
            self.last_order_date = Some(placed_at);
        }
    }

    /// Recompute statistics from scratch.
    ///
    /// `orders` must be the (total, placed_at) pairs of this client's
    /// surviving non-cancelled orders; the existing counters are discarded.
    pub fn rebuild_stats<I>(&mut self, orders: I)
    where
        I: IntoIterator<Item = (Cents, DateTime<Utc>)>,
    {
        self.total_orders = 0;
        self.total_revenue = 0;
        self.last_order_date = None;
        for (total, placed_at) in orders {
            self.bump(total, placed_at);
        }
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn restaurant() -> Client {
        Client::new(
            ClientId::new(),
            NewClient {
                name: "Café Lune".to_string(),
                client_type: ClientType::Restaurant,
                email: Some("orders@cafelune.example".to_string()),
                phone: None,
                address: None,
                notes: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn new_client_starts_active_at_zero() {
        let client = restaurant();
        assert_eq!(client.status(), ClientStatus::Active);
        assert_eq!(client.total_orders(), 0);
        assert_eq!(client.total_revenue(), 0);
        assert_eq!(client.last_order_date(), None);
    }

    #[test]
    fn blank_name_rejected() {
        let err = Client::new(
            ClientId::new(),
            NewClient {
                name: "   ".to_string(),
                client_type: ClientType::Shop,
                email: None,
                phone: None,
                address: None,
                notes: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn bump_accumulates_and_keeps_latest_date() {
        let mut client = restaurant();
        let earlier = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap();

        client.bump(25080, later);
        client.bump(10000, earlier);

        assert_eq!(client.total_orders(), 2);
        assert_eq!(client.total_revenue(), 35080);
        // Out-of-order bumps never move last_order_date backwards.
        assert_eq!(client.last_order_date(), Some(later));
    }

    #[test]
    fn rebuild_replaces_drifted_counters() {
        let mut client = restaurant();
        client.bump(99999, Utc::now());
        client.bump(99999, Utc::now());

        let placed_at = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        client.rebuild_stats(vec![(25080, placed_at)]);

        assert_eq!(client.total_orders(), 1);
        assert_eq!(client.total_revenue(), 25080);
        assert_eq!(client.last_order_date(), Some(placed_at));
    }

    #[test]
    fn rebuild_from_nothing_zeroes() {
        let mut client = restaurant();
        client.bump(500, Utc::now());
        client.rebuild_stats(std::iter::empty());
        assert_eq!(client.total_orders(), 0);
        assert_eq!(client.total_revenue(), 0);
        assert_eq!(client.last_order_date(), None);
    }
}
