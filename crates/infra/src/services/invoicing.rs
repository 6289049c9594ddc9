use chrono::{NaiveDate, Utc};

use creamery_auth::Principal;
use creamery_core::{DomainResult, InvoiceId, OrderId};
use creamery_invoicing::{Invoice, IssuePolicy, NewInvoice};
use creamery_orders::Order;
use creamery_store::{RecordWrite, TxStore};

use crate::collections;
use crate::services::{load, load_all, with_retry};

/// Issues invoices and drives their lifecycle.
///
/// Overdue detection in bulk and payment reminders live in the scheduled
/// jobs; this service only handles single invoices.
#[derive(Debug, Clone)]
pub struct InvoicingService<S> {
    store: S,
    policy: IssuePolicy,
}

impl<S: TxStore> InvoicingService<S> {
    pub fn new(store: S, policy: IssuePolicy) -> Self {
        Self { store, policy }
    }

    /// Issue an invoice from an existing order's snapshot.
    pub fn from_order(&self, order_id: OrderId, actor: &Principal) -> DomainResult<Invoice> {
        let (order, _): (Order, u64) = load(&self.store, collections::ORDERS, order_id)?;
        let invoice = Invoice::from_order(
            InvoiceId::new(),
            &order,
            self.policy,
            actor.user_id,
            Utc::now(),
        )?;
        self.insert(&invoice)?;
        Ok(invoice)
    }

    /// Issue an ad-hoc invoice.
    pub fn create(&self, spec: NewInvoice, actor: &Principal) -> DomainResult<Invoice> {
        let invoice = Invoice::new(InvoiceId::new(), spec, self.policy, actor.user_id, Utc::now())?;
        self.insert(&invoice)?;
        Ok(invoice)
    }

    pub fn get(&self, id: InvoiceId) -> DomainResult<Invoice> {
        let (invoice, _) = load(&self.store, collections::INVOICES, id)?;
        Ok(invoice)
    }

    pub fn list(&self) -> DomainResult<Vec<Invoice>> {
        load_all(&self.store, collections::INVOICES)
    }

    pub fn mark_sent(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.mutate(id, |invoice| invoice.mark_sent())
    }

    /// Record payment, optionally with how it was settled.
    pub fn mark_paid(
        &self,
        id: InvoiceId,
        method: Option<String>,
        reference: Option<String>,
    ) -> DomainResult<Invoice> {
        self.mutate(id, |invoice| {
            invoice.mark_paid(Utc::now(), method.clone(), reference.clone())
        })
    }

    /// Flag one invoice overdue (the sweep job does this in bulk).
    pub fn mark_overdue(&self, id: InvoiceId, today: NaiveDate) -> DomainResult<Invoice> {
        self.mutate(id, |invoice| invoice.mark_overdue(today).map(|_| ()))
    }

    pub fn cancel_invoice(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.mutate(id, |invoice| invoice.cancel())
    }

    fn insert(&self, invoice: &Invoice) -> DomainResult<()> {
        self.store.commit(vec![RecordWrite::insert(
            collections::INVOICES,
            invoice.id_typed(),
            invoice,
        )?])?;
        tracing::info!(
            invoice_number = invoice.invoice_number(),
            total = invoice.total(),
            due = %invoice.due_date(),
            "invoice issued"
        );
        Ok(())
    }

    fn mutate(
        &self,
        id: InvoiceId,
        op: impl Fn(&mut Invoice) -> DomainResult<()>,
    ) -> DomainResult<Invoice> {
        with_retry(|| {
            let (mut invoice, version): (Invoice, u64) =
                load(&self.store, collections::INVOICES, id)?;
            op(&mut invoice)?;
            self.store.commit(vec![RecordWrite::update(
                collections::INVOICES,
                id,
                version,
                &invoice,
            )?])?;
            Ok(invoice)
        })
    }
}
