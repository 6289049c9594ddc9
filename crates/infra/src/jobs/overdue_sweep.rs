use chrono::{NaiveDate, NaiveTime};

use creamery_core::DomainResult;
use creamery_events::{Notification, NotificationSink};
use creamery_invoicing::{Invoice, InvoiceStatus};
use creamery_store::{RecordWrite, TxStore, decode};

use crate::collections;

/// Flag every sent invoice past its due date as overdue and emit a payment
/// reminder for it.
///
/// Idempotent: invoices already overdue are skipped, so rerunning the sweep
/// (or two overlapping runs) reminds each client at most once per
/// transition. Returns how many invoices this run transitioned.
pub fn sweep_overdue_invoices<S, N>(store: &S, sink: &N, today: NaiveDate) -> DomainResult<usize>
where
    S: TxStore,
    N: NotificationSink,
{
    let mut flagged = 0;
    for record in store.list(collections::INVOICES)? {
        let mut invoice: Invoice = decode(&record)?;
        if invoice.status() != InvoiceStatus::Sent || today <= invoice.due_date() {
            continue;
        }
        if !invoice.mark_overdue(today)? {
            continue;
        }
        // A lost race here means someone else just touched this invoice;
        // the next sweep will pick it up if it is still overdue.
        let write = RecordWrite::update(collections::INVOICES, record.id, record.version, &invoice)?;
        if let Err(err) = store.commit(vec![write]) {
            tracing::debug!(invoice_number = invoice.invoice_number(), error = %err, "overdue sweep skipped invoice");
            continue;
        }

        sink.notify(Notification::PaymentDue {
            invoice_id: invoice.id_typed(),
            invoice_number: invoice.invoice_number().to_string(),
            client_name: invoice.client_name().to_string(),
            total: invoice.total(),
            due_date: invoice.due_date().and_time(NaiveTime::MIN).and_utc(),
        });
        flagged += 1;
    }

    if flagged > 0 {
        tracing::info!(flagged, "overdue sweep flagged invoices");
    }
    Ok(flagged)
}
