use crate::error::Result;
use crate::settings::{check_key, encode_logo, CompanySettings, COMPANY_LOGO};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub fn get_settings(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;

    let settings = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<HashMap<String, String>>>()?;

    Ok(settings)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    check_key(key)?;
    Ok(get_settings(conn)?.remove(key))
}

/// Saves every pair or none. Unknown keys are rejected.
pub fn save_settings(conn: &mut Connection, settings: &HashMap<String, String>) -> Result<()> {
    for key in settings.keys() {
        check_key(key)?;
    }

    let tx = conn.transaction()?;
    {
        let mut stmt =
            tx.prepare_cached("INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)")?;
        for (key, value) in settings {
            stmt.execute([key, value])?;
        }
    }
    tx.commit()?;

    info!(count = settings.len(), "settings saved");
    Ok(())
}

pub fn company_settings(conn: &Connection) -> Result<CompanySettings> {
    Ok(CompanySettings::from_map(&get_settings(conn)?))
}

/// Reads an image from disk and stores it as the company logo.
pub fn load_logo(conn: &Connection, path: impl AsRef<Path>) -> Result<String> {
    let bytes = std::fs::read(path.as_ref())?;
    let encoded = encode_logo(&bytes)?;

    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        [COMPANY_LOGO, encoded.as_str()],
    )?;
    info!(bytes = bytes.len(), "logo stored");
    Ok(encoded)
}

pub fn remove_logo(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?1", [COMPANY_LOGO])?;
    Ok(())
}
