//! SQLite repositories, one module per document family.
//!
//! Reads take `&Connection`. Writes touching more than one row take
//! `&mut Connection` and run in a single transaction.

pub mod clients;
pub mod invoices;
pub mod products;
pub mod proformas;
pub mod purchase_orders;
pub mod purchases;
pub mod reports;
pub mod settings;
pub mod suppliers;

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;

/// Next document number of the year, e.g. `FAC-2024-0007`.
///
/// `table` and `column` are fixed identifiers chosen by this crate.
pub(crate) fn next_number(
    conn: &Connection,
    table: &str,
    column: &str,
    prefix: &str,
    date: NaiveDate,
) -> Result<String> {
    let stem = format!("{}-{}-", prefix, date.year());
    let last: Option<i64> = conn.query_row(
        &format!(
            "SELECT MAX(CAST(substr({column}, ?1) AS INTEGER)) FROM {table} WHERE {column} LIKE ?2"
        ),
        rusqlite::params![stem.len() as i64 + 1, format!("{stem}%")],
        |row| row.get(0),
    )?;
    Ok(format!("{}{:04}", stem, last.unwrap_or(0) + 1))
}

pub(crate) fn count(conn: &Connection, sql: &str, id: i64) -> Result<i64> {
    Ok(conn.query_row(sql, [id], |row| row.get(0))?)
}

/// Maps a UNIQUE constraint failure to a user-facing conflict.
pub(crate) fn unique_violation(err: rusqlite::Error, message: String) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::Conflict(message)
        }
        other => Error::Database(other),
    }
}
