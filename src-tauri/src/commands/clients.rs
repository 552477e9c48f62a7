use crate::db::DatabaseExt;
use sama_core::models::{Client, ClientInput, ClientSummary};
use sama_core::store::clients;
use tauri::AppHandle;

#[tauri::command]
pub fn get_clients(app: AppHandle) -> Result<Vec<ClientSummary>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    clients::list_client_summaries(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_client(app: AppHandle, id: i64) -> Result<ClientSummary, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    clients::get_client_summary(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_client(app: AppHandle, client: ClientInput) -> Result<Client, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    clients::create_client(&conn, &client).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_client(app: AppHandle, id: i64, client: ClientInput) -> Result<Client, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    clients::update_client(&conn, id, &client).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_client(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    clients::delete_client(&conn, id).map_err(|e| e.to_string())
}
