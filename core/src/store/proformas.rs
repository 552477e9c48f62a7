use crate::error::{Error, Result};
use crate::models::{
    Invoice, InvoiceItem, NewInvoice, NewProforma, Proforma, ProformaItem, ProformaStatus,
};
use crate::store::{clients, invoices, next_number};
use crate::totals;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, instrument, warn};

const HEADER_QUERY: &str =
    "SELECT f.id, f.number, f.client_id, c.name, f.issue_date, f.valid_until, f.status, f.invoice_id, f.created_at
     FROM proformas f
     LEFT JOIN clients c ON f.client_id = c.id";

fn proforma_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Proforma> {
    Ok(Proforma {
        id: row.get(0)?,
        number: row.get(1)?,
        client_id: row.get(2)?,
        client_name: row.get(3)?,
        issue_date: row.get(4)?,
        valid_until: row.get(5)?,
        status: row.get(6)?,
        invoice_id: row.get(7)?,
        created_at: row.get(8)?,
        items: Vec::new(),
        total_amount: 0,
    })
}

fn with_items(conn: &Connection, mut proforma: Proforma) -> Result<Proforma> {
    let mut stmt = conn.prepare_cached(
        "SELECT product_id, product_name, quantity, unit_price
         FROM proforma_items WHERE proforma_id = ?1 ORDER BY id",
    )?;

    proforma.items = stmt
        .query_map([proforma.id], |row| {
            Ok(ProformaItem {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    proforma.total_amount = totals::total_amount(&proforma.items);

    Ok(proforma)
}

pub fn get_proforma(conn: &Connection, id: i64) -> Result<Proforma> {
    let proforma = conn
        .query_row(&format!("{HEADER_QUERY} WHERE f.id = ?1"), [id], proforma_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Proforma", id))?;
    with_items(conn, proforma)
}

pub fn list_proformas(conn: &Connection, status: Option<ProformaStatus>) -> Result<Vec<Proforma>> {
    let mut stmt = conn.prepare(&format!(
        "{HEADER_QUERY}
         WHERE ?1 IS NULL OR f.status = ?1
         ORDER BY f.issue_date DESC, f.id DESC"
    ))?;

    let headers = stmt
        .query_map([status], proforma_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    headers.into_iter().map(|p| with_items(conn, p)).collect()
}

#[instrument(skip(conn, proforma))]
pub fn create_proforma(conn: &mut Connection, proforma: &NewProforma) -> Result<Proforma> {
    if proforma.items.is_empty() {
        return Err(Error::validation("Ajoutez au moins un article"));
    }
    for (index, item) in proforma.items.iter().enumerate() {
        if item.product_id <= 0 || item.quantity <= 0 || item.unit_price <= 0 {
            return Err(Error::validation(format!(
                "Ligne {} : produit, quantité et prix sont obligatoires",
                index + 1
            )));
        }
        totals::check_quantity(index + 1, item.quantity)?;
        totals::check_price(index + 1, "le prix unitaire", item.unit_price)?;
    }
    if let Some(valid_until) = proforma.valid_until {
        if valid_until < proforma.issue_date {
            return Err(Error::validation(
                "La date de validité doit suivre la date d'émission",
            ));
        }
    }

    let tx = conn.transaction()?;
    if let Some(client_id) = proforma.client_id {
        clients::get_client(&tx, client_id)?;
    }

    let number = next_number(&tx, "proformas", "number", "PRO", proforma.issue_date)?;
    tx.execute(
        "INSERT INTO proformas (number, client_id, issue_date, valid_until, status) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            number,
            proforma.client_id,
            proforma.issue_date,
            proforma.valid_until,
            ProformaStatus::Draft,
        ],
    )?;
    let id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO proforma_items (proforma_id, product_id, product_name, quantity, unit_price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for item in &proforma.items {
            stmt.execute(rusqlite::params![
                id,
                item.product_id,
                item.product_name,
                item.quantity,
                item.unit_price,
            ])?;
        }
    }
    tx.commit()?;

    info!(id, number = %number, "proforma created");
    get_proforma(conn, id)
}

pub fn mark_proforma_sent(conn: &Connection, id: i64) -> Result<Proforma> {
    let proforma = get_proforma(conn, id)?;
    if proforma.status == ProformaStatus::Converted {
        return Err(Error::Conflict("Cette proforma a déjà été facturée".to_string()));
    }

    conn.execute(
        "UPDATE proformas SET status = ?1 WHERE id = ?2",
        rusqlite::params![ProformaStatus::Sent, id],
    )?;
    get_proforma(conn, id)
}

pub fn delete_proforma(conn: &Connection, id: i64) -> Result<()> {
    let proforma = get_proforma(conn, id)?;
    if proforma.status == ProformaStatus::Converted {
        warn!(id, "refusing to delete converted proforma");
        return Err(Error::Conflict(
            "Impossible de supprimer une proforma déjà facturée".to_string(),
        ));
    }

    conn.execute("DELETE FROM proforma_items WHERE proforma_id = ?1", [id])?;
    conn.execute("DELETE FROM proformas WHERE id = ?1", [id])?;
    Ok(())
}

/// Issues the final invoice for a proforma, with the same lines. With a
/// `depot` the goods leave that depot's stock; without one stock is untouched.
#[instrument(skip(conn))]
pub fn convert_to_invoice(
    conn: &mut Connection,
    id: i64,
    issue_date: NaiveDate,
    depot: Option<&str>,
) -> Result<Invoice> {
    let tx = conn.transaction()?;
    let proforma = get_proforma(&tx, id)?;
    if proforma.status == ProformaStatus::Converted {
        return Err(Error::Conflict("Cette proforma a déjà été facturée".to_string()));
    }

    let invoice = NewInvoice {
        client_id: proforma.client_id,
        issue_date,
        items: proforma
            .items
            .iter()
            .map(|item| InvoiceItem {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                depot: depot.map(str::to_string),
            })
            .collect(),
        payments: Vec::new(),
        notes: Some(format!("Suivant proforma {}", proforma.number)),
    };
    let invoice_id = invoices::insert_invoice(&tx, &invoice, Some(id))?;

    tx.execute(
        "UPDATE proformas SET status = ?1, invoice_id = ?2 WHERE id = ?3",
        rusqlite::params![ProformaStatus::Converted, invoice_id, id],
    )?;
    tx.commit()?;

    info!(id, invoice_id, "proforma converted");
    invoices::get_invoice(conn, invoice_id)
}
