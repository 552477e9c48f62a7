use crate::balances;
use crate::error::{Error, Result};
use crate::models::{Client, ClientInput, ClientSummary, InvoiceFilter};
use crate::store::{count, invoices};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, warn};
use validator::Validate;

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        address: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn list_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt =
        conn.prepare("SELECT id, name, phone, email, address, created_at FROM clients ORDER BY name")?;

    let clients = stmt
        .query_map([], client_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(clients)
}

pub fn get_client(conn: &Connection, id: i64) -> Result<Client> {
    conn.query_row(
        "SELECT id, name, phone, email, address, created_at FROM clients WHERE id = ?1",
        [id],
        client_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Client", id))
}

pub fn list_client_summaries(conn: &Connection) -> Result<Vec<ClientSummary>> {
    let clients = list_clients(conn)?;
    let invoices = invoices::list_invoices(conn, &InvoiceFilter::default())?;
    Ok(balances::summarize_clients(clients, &invoices))
}

pub fn get_client_summary(conn: &Connection, id: i64) -> Result<ClientSummary> {
    let client = get_client(conn, id)?;
    let filter = InvoiceFilter {
        client_id: Some(id),
        ..InvoiceFilter::default()
    };
    let invoices = invoices::list_invoices(conn, &filter)?;
    Ok(ClientSummary {
        account: balances::calculate_client_totals(&invoices, id),
        client,
    })
}

pub fn create_client(conn: &Connection, client: &ClientInput) -> Result<Client> {
    client.validate()?;

    conn.execute(
        "INSERT INTO clients (name, phone, email, address) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![client.name.trim(), client.phone, client.email, client.address],
    )?;

    let id = conn.last_insert_rowid();
    info!(id, name = %client.name, "client created");
    get_client(conn, id)
}

pub fn update_client(conn: &Connection, id: i64, client: &ClientInput) -> Result<Client> {
    client.validate()?;

    let changed = conn.execute(
        "UPDATE clients SET name = ?1, phone = ?2, email = ?3, address = ?4 WHERE id = ?5",
        rusqlite::params![client.name.trim(), client.phone, client.email, client.address, id],
    )?;

    if changed == 0 {
        return Err(Error::not_found("Client", id));
    }
    get_client(conn, id)
}

pub fn delete_client(conn: &Connection, id: i64) -> Result<()> {
    let documents = count(conn, "SELECT COUNT(*) FROM invoices WHERE client_id = ?1", id)?
        + count(conn, "SELECT COUNT(*) FROM proformas WHERE client_id = ?1", id)?;

    if documents > 0 {
        warn!(id, documents, "refusing to delete client with documents");
        return Err(Error::Conflict(
            "Impossible de supprimer un client ayant des factures ou des proformas".to_string(),
        ));
    }

    conn.execute("DELETE FROM clients WHERE id = ?1", [id])?;
    Ok(())
}
