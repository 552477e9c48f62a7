use crate::db::DatabaseExt;
use sama_core::models::{Supplier, SupplierInput, SupplierSummary};
use sama_core::store::suppliers;
use tauri::AppHandle;

/// Suppliers with their computed account balance.
#[tauri::command]
pub fn get_suppliers(app: AppHandle) -> Result<Vec<SupplierSummary>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    suppliers::list_supplier_summaries(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_supplier(app: AppHandle, id: i64) -> Result<SupplierSummary, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    suppliers::get_supplier_summary(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_supplier(app: AppHandle, supplier: SupplierInput) -> Result<Supplier, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    suppliers::create_supplier(&conn, &supplier).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_supplier(app: AppHandle, id: i64, supplier: SupplierInput) -> Result<Supplier, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    suppliers::update_supplier(&conn, id, &supplier).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_supplier(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    suppliers::delete_supplier(&conn, id).map_err(|e| e.to_string())
}
