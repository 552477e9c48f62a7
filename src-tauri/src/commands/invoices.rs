use crate::db::DatabaseExt;
use sama_core::models::{CashierSale, Invoice, InvoiceFilter, NewInvoice, NewPayment, SaleReceipt};
use sama_core::store::invoices;
use tauri::AppHandle;

#[tauri::command]
pub fn get_invoices(app: AppHandle, filter: Option<InvoiceFilter>) -> Result<Vec<Invoice>, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    invoices::list_invoices(&conn, &filter.unwrap_or_default()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_invoice(app: AppHandle, id: i64) -> Result<Invoice, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    invoices::get_invoice(&conn, id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_invoice(app: AppHandle, invoice: NewInvoice) -> Result<Invoice, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    invoices::create_invoice(&mut conn, &invoice).map_err(|e| e.to_string())
}

/// Cashier checkout. The invoice is dated today.
#[tauri::command]
pub fn record_sale(app: AppHandle, sale: CashierSale) -> Result<SaleReceipt, String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    let today = chrono::Local::now().date_naive();
    invoices::record_sale(&mut conn, &sale, today).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn add_invoice_payment(app: AppHandle, invoice_id: i64, payment: NewPayment) -> Result<Invoice, String> {
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    invoices::add_invoice_payment(&conn, invoice_id, &payment).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_invoice(app: AppHandle, id: i64) -> Result<(), String> {
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    invoices::delete_invoice(&mut conn, id).map_err(|e| e.to_string())
}
