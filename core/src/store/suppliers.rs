use crate::balances;
use crate::error::{Error, Result};
use crate::models::{PurchaseFilter, Supplier, SupplierInput, SupplierSummary};
use crate::store::{count, purchases};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, warn};
use validator::Validate;

fn supplier_from_row(row: &Row<'_>) -> rusqlite::Result<Supplier> {
    Ok(Supplier {
        id: row.get(0)?,
        name: row.get(1)?,
        contact: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn list_suppliers(conn: &Connection) -> Result<Vec<Supplier>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, contact, phone, email, address, created_at FROM suppliers ORDER BY name",
    )?;

    let suppliers = stmt
        .query_map([], supplier_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(suppliers)
}

pub fn get_supplier(conn: &Connection, id: i64) -> Result<Supplier> {
    conn.query_row(
        "SELECT id, name, contact, phone, email, address, created_at FROM suppliers WHERE id = ?1",
        [id],
        supplier_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Fournisseur", id))
}

/// Suppliers with their account figures, computed from their purchases.
pub fn list_supplier_summaries(conn: &Connection) -> Result<Vec<SupplierSummary>> {
    let suppliers = list_suppliers(conn)?;
    let purchases = purchases::list_purchases(conn, &PurchaseFilter::default())?;
    Ok(balances::summarize_suppliers(suppliers, &purchases))
}

pub fn get_supplier_summary(conn: &Connection, id: i64) -> Result<SupplierSummary> {
    let supplier = get_supplier(conn, id)?;
    let filter = PurchaseFilter {
        supplier_id: Some(id),
        ..PurchaseFilter::default()
    };
    let purchases = purchases::list_purchases(conn, &filter)?;
    Ok(SupplierSummary {
        account: balances::calculate_supplier_totals(&purchases, id),
        supplier,
    })
}

pub fn create_supplier(conn: &Connection, supplier: &SupplierInput) -> Result<Supplier> {
    supplier.validate()?;

    conn.execute(
        "INSERT INTO suppliers (name, contact, phone, email, address) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            supplier.name.trim(),
            supplier.contact,
            supplier.phone,
            supplier.email,
            supplier.address,
        ],
    )?;

    let id = conn.last_insert_rowid();
    info!(id, name = %supplier.name, "supplier created");
    get_supplier(conn, id)
}

pub fn update_supplier(conn: &Connection, id: i64, supplier: &SupplierInput) -> Result<Supplier> {
    supplier.validate()?;

    let changed = conn.execute(
        "UPDATE suppliers SET name = ?1, contact = ?2, phone = ?3, email = ?4, address = ?5 WHERE id = ?6",
        rusqlite::params![
            supplier.name.trim(),
            supplier.contact,
            supplier.phone,
            supplier.email,
            supplier.address,
            id,
        ],
    )?;

    if changed == 0 {
        return Err(Error::not_found("Fournisseur", id));
    }
    get_supplier(conn, id)
}

pub fn delete_supplier(conn: &Connection, id: i64) -> Result<()> {
    let documents = count(conn, "SELECT COUNT(*) FROM purchases WHERE supplier_id = ?1", id)?
        + count(conn, "SELECT COUNT(*) FROM purchase_orders WHERE supplier_id = ?1", id)?;

    if documents > 0 {
        warn!(id, documents, "refusing to delete supplier with documents");
        return Err(Error::Conflict(
            "Impossible de supprimer un fournisseur ayant des achats ou des commandes".to_string(),
        ));
    }

    conn.execute("DELETE FROM suppliers WHERE id = ?1", [id])?;
    Ok(())
}
