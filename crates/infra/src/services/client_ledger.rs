use chrono::{DateTime, Utc};

use creamery_clients::{Client, NewClient};
use creamery_core::{Cents, ClientId, DomainResult};
use creamery_orders::{Order, OrderStatus};
use creamery_store::{RecordWrite, TxStore};

use crate::collections;
use crate::services::{load, load_all, with_retry};

/// Client registry and purchase statistics.
///
/// The statistics are denormalized counters, not a source of truth: orders
/// are. [`ClientLedger::rebuild`] recomputes them from the orders collection
/// whenever drift is suspected.
#[derive(Debug, Clone)]
pub struct ClientLedger<S> {
    store: S,
}

impl<S: TxStore> ClientLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn register(&self, spec: NewClient) -> DomainResult<Client> {
        let client = Client::new(ClientId::new(), spec)?;
        self.store.commit(vec![RecordWrite::insert(
            collections::CLIENTS,
            client.id_typed(),
            &client,
        )?])?;
        tracing::info!(client_id = %client.id_typed(), name = client.name(), "client registered");
        Ok(client)
    }

    pub fn get(&self, id: ClientId) -> DomainResult<Client> {
        let (client, _) = load(&self.store, collections::CLIENTS, id)?;
        Ok(client)
    }

    pub fn list(&self) -> DomainResult<Vec<Client>> {
        load_all(&self.store, collections::CLIENTS)
    }

    /// Add one order to the client's counters.
    pub fn bump(&self, id: ClientId, total: Cents, placed_at: DateTime<Utc>) -> DomainResult<Client> {
        with_retry(|| {
            let (mut client, version): (Client, u64) =
                load(&self.store, collections::CLIENTS, id)?;
            client.bump(total, placed_at);
            self.store.commit(vec![RecordWrite::update(
                collections::CLIENTS,
                id,
                version,
                &client,
            )?])?;
            Ok(client)
        })
    }

    /// Recompute a client's counters from their surviving orders.
    pub fn rebuild(&self, id: ClientId) -> DomainResult<Client> {
        with_retry(|| {
            let (mut client, version): (Client, u64) =
                load(&self.store, collections::CLIENTS, id)?;
            let orders: Vec<Order> = load_all(&self.store, collections::ORDERS)?;
            client.rebuild_stats(orders.iter().filter_map(|order| {
                (order.client_id() == id && order.status() != OrderStatus::Cancelled)
                    .then(|| (order.total(), order.created_at()))
            }));
            self.store.commit(vec![RecordWrite::update(
                collections::CLIENTS,
                id,
                version,
                &client,
            )?])?;
            Ok(client)
        })
    }
}
