use crate::db::DatabaseExt;
use sama_core::printing::{self, DepotSelection, PrintedDocument};
use sama_core::store::{invoices, proformas, purchases, settings};
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager};
use tauri_plugin_opener::OpenerExt;
use tracing::{error, info};

const OPEN_FAILED: &str = "Impossible d'ouvrir la fenêtre d'impression";

/// Keeps letters, digits, `-` and `_` so document numbers make safe file names.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}

fn write_document(dir: &Path, document: &PrintedDocument) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.html", sanitize_file_name(&document.name)));
    std::fs::write(&path, &document.html)?;
    Ok(path)
}

/// Writes the page under the cache dir and hands it to the system browser,
/// which prints it when auto print is on.
fn open_document(app: &AppHandle, document: PrintedDocument) -> Result<String, String> {
    let dir = app
        .path()
        .app_cache_dir()
        .map_err(|e| e.to_string())?
        .join("prints");
    let path = write_document(&dir, &document).map_err(|e| e.to_string())?;
    let path = path.to_string_lossy().to_string();

    app.opener()
        .open_path(path.clone(), None::<&str>)
        .map_err(|e| {
            error!(error = %e, path = %path, "could not open print window");
            OPEN_FAILED.to_string()
        })?;

    info!(path = %path, "document sent to print");
    Ok(path)
}

/// `depot` is a depot name, or `None`/`"all"` for every depot of the purchase.
#[tauri::command]
pub fn print_depot_slip(app: AppHandle, purchase_id: i64, depot: Option<String>) -> Result<String, String> {
    let document = {
        let db = app.db();
        let conn = db.conn.lock().map_err(|e| e.to_string())?;

        let purchase = purchases::get_purchase(&conn, purchase_id).map_err(|e| e.to_string())?;
        let company = settings::company_settings(&conn).map_err(|e| e.to_string())?;
        printing::render_depot_slip(&purchase, &DepotSelection::from_option(depot), &company)
            .map_err(|e| e.to_string())?
    };

    open_document(&app, document)
}

#[tauri::command]
pub fn print_invoice(app: AppHandle, invoice_id: i64) -> Result<String, String> {
    let document = {
        let db = app.db();
        let conn = db.conn.lock().map_err(|e| e.to_string())?;

        let invoice = invoices::get_invoice(&conn, invoice_id).map_err(|e| e.to_string())?;
        let company = settings::company_settings(&conn).map_err(|e| e.to_string())?;
        printing::render_invoice_a4(&invoice, &company).map_err(|e| e.to_string())?
    };

    open_document(&app, document)
}

#[tauri::command]
pub fn print_proforma(app: AppHandle, proforma_id: i64) -> Result<String, String> {
    let document = {
        let db = app.db();
        let conn = db.conn.lock().map_err(|e| e.to_string())?;

        let proforma = proformas::get_proforma(&conn, proforma_id).map_err(|e| e.to_string())?;
        let company = settings::company_settings(&conn).map_err(|e| e.to_string())?;
        printing::render_proforma_a4(&proforma, &company).map_err(|e| e.to_string())?
    };

    open_document(&app, document)
}

/// Cashier ticket. `change_due` is the value returned by `record_sale`.
#[tauri::command]
pub fn print_receipt(app: AppHandle, invoice_id: i64, change_due: Option<i64>) -> Result<String, String> {
    let document = {
        let db = app.db();
        let conn = db.conn.lock().map_err(|e| e.to_string())?;

        let invoice = invoices::get_invoice(&conn, invoice_id).map_err(|e| e.to_string())?;
        let company = settings::company_settings(&conn).map_err(|e| e.to_string())?;
        printing::render_receipt_80mm(&invoice, change_due.unwrap_or(0), &company)
            .map_err(|e| e.to_string())?
    };

    open_document(&app, document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("facture-FAC-2024-0001"), "facture-FAC-2024-0001");
        assert_eq!(sanitize_file_name("bon-entree-ACH/01:Dépôt Nord"), "bon-entree-ACH-01-Dépôt-Nord");
        assert_eq!(sanitize_file_name("../../etc"), "etc");
        assert_eq!(sanitize_file_name("///"), "document");
    }

    #[test]
    fn test_write_document_creates_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let prints = dir.path().join("prints");
        let document = PrintedDocument {
            name: "ticket FAC-2024-0003".to_string(),
            html: "<html><body>ok</body></html>".to_string(),
        };

        let path = write_document(&prints, &document).unwrap();

        assert_eq!(path, prints.join("ticket-FAC-2024-0003.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), document.html);
    }
}
