use crate::db::DatabaseExt;
use sama_core::models::{Category, CreateProduct, Product};
use sama_core::store::products;
use tauri::AppHandle;

// ===== CATEGORIES =====

#[tauri::command]
pub fn get_categories(app: AppHandle) -> Result<Vec<Category>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::list_categories(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_category(app: AppHandle, name: String) -> Result<Category, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::create_category(&conn, &name).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_category(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::delete_category(&mut conn, id).map_err(|e| e.to_string())
}

// ===== PRODUCTS =====

#[tauri::command]
pub fn get_products(app: AppHandle) -> Result<Vec<Product>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::list_products(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn search_products(app: AppHandle, query: String) -> Result<Vec<Product>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::search_products(&conn, &query).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_product(app: AppHandle, product: CreateProduct) -> Result<Product, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::create_product(&conn, &product).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_product(app: AppHandle, id: i64, product: CreateProduct) -> Result<Product, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::update_product(&conn, id, &product).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_product(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    products::delete_product(&conn, id).map_err(|e| e.to_string())
}
