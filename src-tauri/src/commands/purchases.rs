use crate::db::DatabaseExt;
use sama_core::models::{NewPayment, NewPurchase, Purchase, PurchaseFilter};
use sama_core::store::purchases;
use tauri::AppHandle;

#[tauri::command]
pub fn get_purchases(app: AppHandle, filter: Option<PurchaseFilter>) -> Result<Vec<Purchase>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::list_purchases(&conn, &filter.unwrap_or_default()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_purchase(app: AppHandle, id: i64) -> Result<Purchase, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::get_purchase(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_purchase(app: AppHandle, purchase: NewPurchase) -> Result<Purchase, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::create_purchase(&mut conn, &purchase).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_purchase(app: AppHandle, id: i64, purchase: NewPurchase) -> Result<Purchase, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::update_purchase(&mut conn, id, &purchase).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_purchase(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::delete_purchase(&mut conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn add_purchase_payment(
    app: AppHandle,
    purchase_id: i64,
    payment: NewPayment,
) -> Result<Purchase, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::add_purchase_payment(&conn, purchase_id, &payment).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_purchase_payment(app: AppHandle, payment_id: i64) -> Result<Purchase, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    purchases::remove_purchase_payment(&conn, payment_id).map_err(|e| e.to_string())
}
