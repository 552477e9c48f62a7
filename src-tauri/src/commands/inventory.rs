use crate::db::DatabaseExt;
use sama_core::inventory;
use sama_core::models::{InventoryRecord, LowStockItem};
use tauri::AppHandle;

#[tauri::command]
pub fn get_inventory(app: AppHandle, depot: Option<String>) -> Result<Vec<InventoryRecord>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    inventory::list_inventory(&conn, depot.as_deref()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_depots(app: AppHandle) -> Result<Vec<String>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    inventory::list_depots(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_product_stock(app: AppHandle, product_id: i64) -> Result<i64, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    inventory::stock_for_product(&conn, product_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_low_stock(app: AppHandle) -> Result<Vec<LowStockItem>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    inventory::low_stock(&conn).map_err(|e| e.to_string())
}
