use crate::db::DatabaseExt;
use chrono::NaiveDate;
use sama_core::models::DaySummary;
use sama_core::store::reports;
use tauri::AppHandle;

/// Sales and collections of a day, today when no date is given.
#[tauri::command]
pub fn get_day_summary(app: AppHandle, date: Option<NaiveDate>) -> Result<DaySummary, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
    reports::day_summary(&conn, date).map_err(|e| e.to_string())
}
