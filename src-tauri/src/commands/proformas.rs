use crate::db::DatabaseExt;
use chrono::NaiveDate;
use sama_core::models::{Invoice, NewProforma, Proforma, ProformaStatus};
use sama_core::store::proformas;
use tauri::AppHandle;

#[tauri::command]
pub fn get_proformas(app: AppHandle, status: Option<ProformaStatus>) -> Result<Vec<Proforma>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    proformas::list_proformas(&conn, status).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_proforma(app: AppHandle, id: i64) -> Result<Proforma, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    proformas::get_proforma(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_proforma(app: AppHandle, proforma: NewProforma) -> Result<Proforma, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    proformas::create_proforma(&mut conn, &proforma).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn mark_proforma_sent(app: AppHandle, id: i64) -> Result<Proforma, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    proformas::mark_proforma_sent(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_proforma(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    proformas::delete_proforma(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn convert_proforma(
    app: AppHandle,
    id: i64,
    issue_date: Option<NaiveDate>,
    depot: Option<String>,
) -> Result<Invoice, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    let issue_date = issue_date.unwrap_or_else(|| chrono::Local::now().date_naive());
    proformas::convert_to_invoice(&mut conn, id, issue_date, depot.as_deref())
        .map_err(|e| e.to_string())
}
