use crate::error::{Error, Result};
use crate::inventory;
use crate::models::{
    CashierSale, Invoice, InvoiceFilter, InvoiceItem, NewInvoice, NewPayment, PaymentMethod,
    SaleReceipt,
};
use crate::payments::{check_payment_amount, PaymentMethodKind};
use crate::store::{clients, next_number};
use crate::totals::{self, DocumentTotals};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, instrument, warn};

struct InvoiceHeader {
    id: i64,
    number: String,
    client_id: Option<i64>,
    client_name: Option<String>,
    issue_date: NaiveDate,
    proforma_id: Option<i64>,
    notes: Option<String>,
    created_at: String,
}

const HEADER_QUERY: &str =
    "SELECT i.id, i.number, i.client_id, c.name, i.issue_date, i.proforma_id, i.notes, i.created_at
     FROM invoices i
     LEFT JOIN clients c ON i.client_id = c.id";

fn header_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvoiceHeader> {
    Ok(InvoiceHeader {
        id: row.get(0)?,
        number: row.get(1)?,
        client_id: row.get(2)?,
        client_name: row.get(3)?,
        issue_date: row.get(4)?,
        proforma_id: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn load_items(conn: &Connection, invoice_id: i64) -> Result<Vec<InvoiceItem>> {
    let mut stmt = conn.prepare_cached(
        "SELECT product_id, product_name, quantity, unit_price, depot
         FROM invoice_items WHERE invoice_id = ?1 ORDER BY id",
    )?;

    let items = stmt
        .query_map([invoice_id], |row| {
            Ok(InvoiceItem {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
                depot: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

fn load_payments(conn: &Connection, invoice_id: i64) -> Result<Vec<PaymentMethod>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, method, amount, date FROM invoice_payments WHERE invoice_id = ?1 ORDER BY date, id",
    )?;

    let payments = stmt
        .query_map([invoice_id], |row| {
            Ok(PaymentMethod {
                id: row.get(0)?,
                method: row.get(1)?,
                amount: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(payments)
}

fn assemble(conn: &Connection, header: InvoiceHeader) -> Result<Invoice> {
    let items = load_items(conn, header.id)?;
    let payments = load_payments(conn, header.id)?;
    let totals = DocumentTotals::compute(&items, &payments);

    Ok(Invoice {
        id: header.id,
        number: header.number,
        client_id: header.client_id,
        client_name: header.client_name,
        issue_date: header.issue_date,
        items,
        payments,
        total_amount: totals.total_amount,
        total_paid: totals.total_paid,
        balance: totals.balance,
        status: totals.status,
        proforma_id: header.proforma_id,
        notes: header.notes,
        created_at: header.created_at,
    })
}

pub fn get_invoice(conn: &Connection, id: i64) -> Result<Invoice> {
    let header = conn
        .query_row(&format!("{HEADER_QUERY} WHERE i.id = ?1"), [id], header_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Facture", id))?;
    assemble(conn, header)
}

pub fn list_invoices(conn: &Connection, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
    let mut stmt = conn.prepare(&format!(
        "{HEADER_QUERY}
         WHERE (?1 IS NULL OR i.client_id = ?1)
           AND (?2 IS NULL OR i.issue_date >= ?2)
           AND (?3 IS NULL OR i.issue_date <= ?3)
         ORDER BY i.issue_date DESC, i.id DESC"
    ))?;

    let headers = stmt
        .query_map(
            rusqlite::params![filter.client_id, filter.from, filter.to],
            header_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut invoices = Vec::with_capacity(headers.len());
    for header in headers {
        let invoice = assemble(conn, header)?;
        if filter.status.map_or(true, |status| invoice.status == status) {
            invoices.push(invoice);
        }
    }

    Ok(invoices)
}

pub(crate) fn check_items(items: &[InvoiceItem]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::validation("Ajoutez au moins un article"));
    }
    for (index, item) in items.iter().enumerate() {
        let line = index + 1;
        if item.product_id <= 0 {
            return Err(Error::validation(format!("Ligne {line} : veuillez sélectionner un produit")));
        }
        if item.quantity <= 0 {
            return Err(Error::validation(format!(
                "Ligne {line} : la quantité doit être supérieure à 0"
            )));
        }
        if item.unit_price <= 0 {
            return Err(Error::validation(format!(
                "Ligne {line} : le prix unitaire doit être supérieur à 0"
            )));
        }
        totals::check_quantity(line, item.quantity)?;
        totals::check_price(line, "le prix unitaire", item.unit_price)?;
    }
    Ok(())
}

fn insert_payment(conn: &Connection, invoice_id: i64, payment: &NewPayment) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO invoice_payments (invoice_id, method, amount, date) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(rusqlite::params![
        invoice_id,
        payment.method,
        payment.amount,
        payment.date
    ])?;
    Ok(())
}

/// Writes an invoice and takes its lines out of stock, without committing.
pub(crate) fn insert_invoice(
    conn: &Connection,
    invoice: &NewInvoice,
    proforma_id: Option<i64>,
) -> Result<i64> {
    check_items(&invoice.items)?;
    for payment in &invoice.payments {
        check_payment_amount(payment.amount)?;
    }
    if let Some(client_id) = invoice.client_id {
        clients::get_client(conn, client_id)?;
    }

    let number = next_number(conn, "invoices", "number", "FAC", invoice.issue_date)?;
    conn.execute(
        "INSERT INTO invoices (number, client_id, issue_date, proforma_id, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![number, invoice.client_id, invoice.issue_date, proforma_id, invoice.notes],
    )?;
    let id = conn.last_insert_rowid();

    let mut item_stmt = conn.prepare_cached(
        "INSERT INTO invoice_items (invoice_id, product_id, product_name, quantity, unit_price, depot)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for item in &invoice.items {
        let depot = item.depot.as_deref().map(str::trim).filter(|d| !d.is_empty());
        item_stmt.execute(rusqlite::params![
            id,
            item.product_id,
            item.product_name,
            item.quantity,
            item.unit_price,
            depot,
        ])?;

        if let Some(depot) = depot {
            inventory::withdraw(conn, item.product_id, depot, item.quantity)?;
        }
    }

    for payment in &invoice.payments {
        insert_payment(conn, id, payment)?;
    }

    info!(id, number = %number, "invoice written");
    Ok(id)
}

#[instrument(skip(conn, invoice))]
pub fn create_invoice(conn: &mut Connection, invoice: &NewInvoice) -> Result<Invoice> {
    let tx = conn.transaction()?;
    let id = insert_invoice(&tx, invoice, None)?;
    tx.commit()?;

    get_invoice(conn, id)
}

/// Counter sale: the invoice is issued today and paid on the spot.
#[instrument(skip(conn, sale))]
pub fn record_sale(conn: &mut Connection, sale: &CashierSale, today: NaiveDate) -> Result<SaleReceipt> {
    check_items(&sale.items)?;
    for payment in &sale.payments {
        check_payment_amount(payment.amount)?;
    }

    let total = totals::total_amount(&sale.items);
    let paid = totals::total_paid(&sale.payments);
    if paid > total {
        return Err(Error::validation(
            "Le total des paiements dépasse le montant de la vente",
        ));
    }

    let cash: i64 = sale
        .payments
        .iter()
        .filter(|p| p.method == PaymentMethodKind::Cash)
        .map(|p| p.amount)
        .sum();
    let change_due = match sale.amount_received {
        Some(_) if cash == 0 => {
            return Err(Error::validation(
                "Le montant reçu ne s'applique qu'à un paiement en espèces",
            ));
        }
        Some(received) if received < cash => {
            return Err(Error::validation("Le montant reçu est inférieur au montant en espèces"));
        }
        Some(received) => received - cash,
        None => 0,
    };

    let invoice = NewInvoice {
        client_id: sale.client_id,
        issue_date: today,
        items: sale.items.clone(),
        payments: sale.payments.clone(),
        notes: None,
    };
    let invoice = create_invoice(conn, &invoice)?;
    if invoice.balance > 0 {
        warn!(number = %invoice.number, balance = invoice.balance, "sale left unpaid balance");
    }

    Ok(SaleReceipt { invoice, change_due })
}

pub fn add_invoice_payment(conn: &Connection, invoice_id: i64, payment: &NewPayment) -> Result<Invoice> {
    check_payment_amount(payment.amount)?;
    get_invoice(conn, invoice_id)?;

    insert_payment(conn, invoice_id, payment)?;

    let invoice = get_invoice(conn, invoice_id)?;
    info!(invoice_id, balance = invoice.balance, "invoice payment recorded");
    Ok(invoice)
}

/// Removes an invoice and puts its depot lines back in stock.
#[instrument(skip(conn))]
pub fn delete_invoice(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let invoice = get_invoice(&tx, id)?;

    for item in &invoice.items {
        if let Some(depot) = item.depot.as_deref() {
            inventory::adjust(&tx, item.product_id, depot, item.quantity)?;
        }
    }

    tx.execute(
        "UPDATE proformas SET status = 'sent', invoice_id = NULL WHERE invoice_id = ?1",
        [id],
    )?;
    tx.execute("DELETE FROM invoice_items WHERE invoice_id = ?1", [id])?;
    tx.execute("DELETE FROM invoice_payments WHERE invoice_id = ?1", [id])?;
    tx.execute("DELETE FROM invoices WHERE id = ?1", [id])?;
    tx.commit()?;

    info!(id, number = %invoice.number, "invoice deleted");
    Ok(())
}
