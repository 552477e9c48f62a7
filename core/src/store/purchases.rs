use crate::error::{Error, Result};
use crate::inventory;
use crate::models::{NewPayment, NewPurchase, PaymentMethod, Purchase, PurchaseFilter, PurchaseItem};
use crate::payments::check_payment_amount;
use crate::purchase_form::check_new_purchase;
use crate::store::{suppliers, unique_violation};
use crate::totals::DocumentTotals;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, instrument};

struct PurchaseHeader {
    id: i64,
    reference: String,
    purchase_date: NaiveDate,
    supplier_id: i64,
    supplier_name: Option<String>,
    notes: Option<String>,
    created_at: String,
}

const HEADER_QUERY: &str = "SELECT p.id, p.reference, p.purchase_date, p.supplier_id, s.name, p.notes, p.created_at
     FROM purchases p
     LEFT JOIN suppliers s ON p.supplier_id = s.id";

fn header_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PurchaseHeader> {
    Ok(PurchaseHeader {
        id: row.get(0)?,
        reference: row.get(1)?,
        purchase_date: row.get(2)?,
        supplier_id: row.get(3)?,
        supplier_name: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn load_items(conn: &Connection, purchase_id: i64) -> Result<Vec<PurchaseItem>> {
    let mut stmt = conn.prepare_cached(
        "SELECT product_id, product_name, quantity, unit_price, sell_price, depot
         FROM purchase_items WHERE purchase_id = ?1 ORDER BY id",
    )?;

    let items = stmt
        .query_map([purchase_id], |row| {
            Ok(PurchaseItem {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
                sell_price: row.get(4)?,
                depot: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

fn load_payments(conn: &Connection, purchase_id: i64) -> Result<Vec<PaymentMethod>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, method, amount, date FROM purchase_payments WHERE purchase_id = ?1 ORDER BY date, id",
    )?;

    let payments = stmt
        .query_map([purchase_id], |row| {
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

fn assemble(conn: &Connection, header: PurchaseHeader) -> Result<Purchase> {
    let items = load_items(conn, header.id)?;
    let payment_methods = load_payments(conn, header.id)?;
    let totals = DocumentTotals::compute(&items, &payment_methods);

    Ok(Purchase {
        id: header.id,
        reference: header.reference,
        purchase_date: header.purchase_date,
        supplier_id: header.supplier_id,
        supplier_name: header.supplier_name.unwrap_or_default(),
        items,
        total_amount: totals.total_amount,
        total_paid: totals.total_paid,
        balance: totals.balance,
        status: totals.status,
        payment_methods,
        notes: header.notes,
        created_at: header.created_at,
    })
}

pub fn get_purchase(conn: &Connection, id: i64) -> Result<Purchase> {
    let header = conn
        .query_row(&format!("{HEADER_QUERY} WHERE p.id = ?1"), [id], header_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Achat", id))?;
    assemble(conn, header)
}

/// Newest first. The status filter applies to the derived status.
pub fn list_purchases(conn: &Connection, filter: &PurchaseFilter) -> Result<Vec<Purchase>> {
    let mut stmt = conn.prepare(&format!(
        "{HEADER_QUERY}
         WHERE (?1 IS NULL OR p.supplier_id = ?1)
           AND (?2 IS NULL OR p.purchase_date >= ?2)
           AND (?3 IS NULL OR p.purchase_date <= ?3)
         ORDER BY p.purchase_date DESC, p.id DESC"
    ))?;

    let headers = stmt
        .query_map(
            rusqlite::params![filter.supplier_id, filter.from, filter.to],
            header_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut purchases = Vec::with_capacity(headers.len());
    for header in headers {
        let purchase = assemble(conn, header)?;
        if filter.status.map_or(true, |status| purchase.status == status) {
            purchases.push(purchase);
        }
    }

    debug!(count = purchases.len(), "purchases listed");
    Ok(purchases)
}

fn insert_lines(conn: &Connection, purchase_id: i64, purchase: &NewPurchase) -> Result<()> {
    let mut item_stmt = conn.prepare_cached(
        "INSERT INTO purchase_items (purchase_id, product_id, product_name, quantity, unit_price, sell_price, depot)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for item in &purchase.items {
        item_stmt.execute(rusqlite::params![
            purchase_id,
            item.product_id,
            item.product_name,
            item.quantity,
            item.unit_price,
            item.sell_price,
            item.depot.trim(),
        ])?;
    }

    for payment in &purchase.payment_methods {
        insert_payment(conn, purchase_id, payment)?;
    }

    Ok(())
}

fn insert_payment(conn: &Connection, purchase_id: i64, payment: &NewPayment) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO purchase_payments (purchase_id, method, amount, date) VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(rusqlite::params![
        purchase_id,
        payment.method,
        payment.amount,
        payment.date
    ])?;
    Ok(())
}

fn trimmed_items(purchase: &NewPurchase) -> Vec<PurchaseItem> {
    purchase
        .items
        .iter()
        .map(|item| PurchaseItem {
            depot: item.depot.trim().to_string(),
            ..item.clone()
        })
        .collect()
}

/// Writes a purchase and merges its lines into stock, without committing.
pub(crate) fn insert_purchase(conn: &Connection, purchase: &NewPurchase) -> Result<i64> {
    suppliers::get_supplier(conn, purchase.supplier_id)?;

    conn.execute(
        "INSERT INTO purchases (reference, purchase_date, supplier_id, notes) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            purchase.reference.trim(),
            purchase.purchase_date,
            purchase.supplier_id,
            purchase.notes,
        ],
    )
    .map_err(|e| {
        unique_violation(
            e,
            format!("Un achat avec la référence {} existe déjà", purchase.reference.trim()),
        )
    })?;

    let id = conn.last_insert_rowid();
    insert_lines(conn, id, purchase)?;
    inventory::apply_items(conn, &trimmed_items(purchase))?;

    Ok(id)
}

#[instrument(skip(conn, purchase), fields(reference = %purchase.reference))]
pub fn create_purchase(conn: &mut Connection, purchase: &NewPurchase) -> Result<Purchase> {
    check_new_purchase(purchase)?;

    let tx = conn.transaction()?;
    let id = insert_purchase(&tx, purchase)?;
    tx.commit()?;

    info!(id, "purchase saved");
    get_purchase(conn, id)
}

/// Overwrites a purchase. The new lines are merged before the old ones are
/// taken back, so only the net change has to be in stock.
#[instrument(skip(conn, purchase))]
pub fn update_purchase(conn: &mut Connection, id: i64, purchase: &NewPurchase) -> Result<Purchase> {
    check_new_purchase(purchase)?;

    let tx = conn.transaction()?;
    let previous = get_purchase(&tx, id)?;
    suppliers::get_supplier(&tx, purchase.supplier_id)?;

    tx.execute(
        "UPDATE purchases SET reference = ?1, purchase_date = ?2, supplier_id = ?3, notes = ?4 WHERE id = ?5",
        rusqlite::params![
            purchase.reference.trim(),
            purchase.purchase_date,
            purchase.supplier_id,
            purchase.notes,
            id,
        ],
    )
    .map_err(|e| {
        unique_violation(
            e,
            format!("Un achat avec la référence {} existe déjà", purchase.reference.trim()),
        )
    })?;
    tx.execute("DELETE FROM purchase_items WHERE purchase_id = ?1", [id])?;
    tx.execute("DELETE FROM purchase_payments WHERE purchase_id = ?1", [id])?;

    insert_lines(&tx, id, purchase)?;
    inventory::apply_items(&tx, &trimmed_items(purchase))?;
    inventory::revert_items(&tx, &previous.items)?;
    tx.commit()?;

    info!(id, "purchase overwritten");
    get_purchase(conn, id)
}

#[instrument(skip(conn))]
pub fn delete_purchase(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let previous = get_purchase(&tx, id)?;

    inventory::revert_items(&tx, &previous.items)?;
    tx.execute("UPDATE purchase_orders SET purchase_id = NULL WHERE purchase_id = ?1", [id])?;
    tx.execute("DELETE FROM purchase_items WHERE purchase_id = ?1", [id])?;
    tx.execute("DELETE FROM purchase_payments WHERE purchase_id = ?1", [id])?;
    tx.execute("DELETE FROM purchases WHERE id = ?1", [id])?;
    tx.commit()?;

    info!(id, "purchase deleted");
    Ok(())
}

#[instrument(skip(conn, payment), fields(amount = payment.amount))]
pub fn add_purchase_payment(conn: &Connection, purchase_id: i64, payment: &NewPayment) -> Result<Purchase> {
    check_payment_amount(payment.amount)?;
    get_purchase(conn, purchase_id)?;

    insert_payment(conn, purchase_id, payment)?;

    let purchase = get_purchase(conn, purchase_id)?;
    info!(purchase_id, balance = purchase.balance, "purchase payment recorded");
    Ok(purchase)
}

pub fn remove_purchase_payment(conn: &Connection, payment_id: i64) -> Result<Purchase> {
    let purchase_id: i64 = conn
        .query_row(
            "SELECT purchase_id FROM purchase_payments WHERE id = ?1",
            [payment_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::not_found("Paiement", payment_id))?;

    conn.execute("DELETE FROM purchase_payments WHERE id = ?1", [payment_id])?;
    info!(purchase_id, payment_id, "purchase payment removed");
    get_purchase(conn, purchase_id)
}
