use crate::db::DatabaseExt;
use chrono::NaiveDate;
use sama_core::models::{NewPurchaseOrder, Purchase, PurchaseOrder, PurchaseOrderStatus};
use sama_core::store::purchase_orders;
use tauri::AppHandle;

#[tauri::command]
pub fn get_purchase_orders(
    app: AppHandle,
    status: Option<PurchaseOrderStatus>,
) -> Result<Vec<PurchaseOrder>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchase_orders::list_purchase_orders(&conn, status).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_purchase_order(app: AppHandle, id: i64) -> Result<PurchaseOrder, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchase_orders::get_purchase_order(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_purchase_order(app: AppHandle, order: NewPurchaseOrder) -> Result<PurchaseOrder, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchase_orders::create_purchase_order(&mut conn, &order).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn cancel_purchase_order(app: AppHandle, id: i64) -> Result<PurchaseOrder, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchase_orders::cancel_purchase_order(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn receive_purchase_order(
    app: AppHandle,
    id: i64,
    depot: String,
    received_on: Option<NaiveDate>,
) -> Result<Purchase, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    let received_on = received_on.unwrap_or_else(|| chrono::Local::now().date_naive());
    purchase_orders::receive_purchase_order(&mut conn, id, &depot, received_on)
        .map_err(|e| e.to_string())
}
