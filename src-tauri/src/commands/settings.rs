use crate::db::DatabaseExt;
use sama_core::settings::CompanySettings;
use sama_core::store::settings as store;
use std::collections::HashMap;
use tauri::AppHandle;

#[tauri::command]
pub fn get_settings(app: AppHandle) -> Result<HashMap<String, String>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    store::get_settings(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn save_settings(app: AppHandle, settings: HashMap<String, String>) -> Result<(), String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    store::save_settings(&mut conn, &settings).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_company_settings(app: AppHandle) -> Result<CompanySettings, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    store::company_settings(&conn).map_err(|e| e.to_string())
}

/// `logo_path` comes from the dialog plugin's file picker.
#[tauri::command]
pub fn load_logo(app: AppHandle, logo_path: String) -> Result<String, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    store::load_logo(&conn, &logo_path).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_logo(app: AppHandle) -> Result<(), String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    store::remove_logo(&conn).map_err(|e| e.to_string())
}
