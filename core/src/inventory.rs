//! Stock per `(product, depot)`.
//!
//! Purchases push quantities in, sales take them out. Callers run these
//! inside the transaction that writes the document so stock and documents
//! never disagree.

use crate::error::{Error, Result};
use crate::models::{InventoryRecord, LowStockItem, PurchaseItem};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

/// Adds `delta` to the record of `(product_id, depot)`, creating it if needed.
pub fn adjust(conn: &Connection, product_id: i64, depot: &str, delta: i64) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO inventory (product_id, depot, quantity) VALUES (?1, ?2, ?3)
         ON CONFLICT(product_id, depot)
         DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = CURRENT_TIMESTAMP",
    )?
    .execute(rusqlite::params![product_id, depot, delta])?;

    debug!(product_id, depot, delta, "inventory adjusted");
    Ok(())
}

/// Merges purchased quantities into the stock of their depot.
pub fn apply_items(conn: &Connection, items: &[PurchaseItem]) -> Result<()> {
    for item in items {
        adjust(conn, item.product_id, &item.depot, item.quantity)?;
    }
    Ok(())
}

/// Takes back what [`apply_items`] added for the same lines. Fails with
/// [`Error::InsufficientStock`] when part of it was already sold.
pub fn revert_items(conn: &Connection, items: &[PurchaseItem]) -> Result<()> {
    for item in items {
        withdraw(conn, item.product_id, &item.depot, item.quantity)?;
    }
    Ok(())
}

pub fn quantity_at(conn: &Connection, product_id: i64, depot: &str) -> Result<i64> {
    let quantity = conn
        .query_row(
            "SELECT quantity FROM inventory WHERE product_id = ?1 AND depot = ?2",
            rusqlite::params![product_id, depot],
            |row| row.get(0),
        )
        .optional()?;
    Ok(quantity.unwrap_or(0))
}

/// Removes sold quantities from a depot, refusing to go below zero.
pub fn withdraw(conn: &Connection, product_id: i64, depot: &str, quantity: i64) -> Result<()> {
    let available = quantity_at(conn, product_id, depot)?;
    if available < quantity {
        let product: String = conn
            .query_row("SELECT name FROM products WHERE id = ?1", [product_id], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or_else(|| format!("#{product_id}"));
        warn!(product_id, depot, quantity, available, "insufficient stock");
        return Err(Error::InsufficientStock {
            product,
            depot: depot.to_string(),
            requested: quantity,
            available,
        });
    }

    adjust(conn, product_id, depot, -quantity)
}

pub fn list_inventory(conn: &Connection, depot: Option<&str>) -> Result<Vec<InventoryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.product_id, p.name, i.depot, i.quantity, i.updated_at
         FROM inventory i
         LEFT JOIN products p ON i.product_id = p.id
         WHERE ?1 IS NULL OR i.depot = ?1
         ORDER BY i.depot, p.name",
    )?;

    let records = stmt
        .query_map([depot], |row| {
            Ok(InventoryRecord {
                id: row.get(0)?,
                product_id: row.get(1)?,
                product_name: row.get(2)?,
                depot: row.get(3)?,
                quantity: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

pub fn list_depots(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT depot FROM inventory ORDER BY depot")?;
    let depots = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(depots)
}

/// Total stock of a product over all depots.
pub fn stock_for_product(conn: &Connection, product_id: i64) -> Result<i64> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(quantity), 0) FROM inventory WHERE product_id = ?1",
        [product_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn low_stock(conn: &Connection) -> Result<Vec<LowStockItem>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, COALESCE(SUM(i.quantity), 0) AS total, p.low_stock_threshold
         FROM products p
         LEFT JOIN inventory i ON i.product_id = p.id
         GROUP BY p.id
         HAVING total <= p.low_stock_threshold
         ORDER BY p.name",
    )?;

    let items = stmt
        .query_map([], |row| {
            Ok(LowStockItem {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                low_stock_threshold: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}
