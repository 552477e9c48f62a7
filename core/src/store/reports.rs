use crate::error::Result;
use crate::models::{DaySummary, InvoiceFilter, PaymentMethod};
use crate::payments;
use crate::store::invoices;
use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, instrument};

/// Closing figures for one business day.
///
/// `revenue` and `outstanding` cover invoices issued that day. `collected`
/// and the per-method split cover every payment dated that day, including
/// settlements of older invoices.
#[instrument(skip(conn))]
pub fn day_summary(conn: &Connection, date: NaiveDate) -> Result<DaySummary> {
    let filter = InvoiceFilter {
        from: Some(date),
        to: Some(date),
        ..InvoiceFilter::default()
    };
    let invoices = invoices::list_invoices(conn, &filter)?;

    let mut stmt = conn.prepare(
        "SELECT id, method, amount, date FROM invoice_payments WHERE date = ?1 ORDER BY id",
    )?;
    let payments = stmt
        .query_map([date], |row| {
            Ok(PaymentMethod {
                id: row.get(0)?,
                method: row.get(1)?,
                amount: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let revenue = invoices.iter().map(|i| i.total_amount).sum();
    let outstanding = invoices.iter().map(|i| i.balance.max(0)).sum();
    let collected = payments.iter().map(|p| p.amount).sum();

    debug!(invoices = invoices.len(), payments = payments.len(), "day summarised");
    Ok(DaySummary {
        date,
        total_sales: invoices.len() as i64,
        revenue,
        collected,
        outstanding,
        by_method: payments::breakdown(&payments),
        invoices,
    })
}
