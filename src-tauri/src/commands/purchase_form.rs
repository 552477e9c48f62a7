//! The purchase entry screen. The form lives in app state so that line
//! edits do not round-trip through the database.
//!
//! Lock order is form first, then database.

use crate::db::DatabaseExt;
use chrono::NaiveDate;
use sama_core::models::Purchase;
use sama_core::payments::PaymentMethodKind;
use sama_core::purchase_form::{FieldValue, ItemField, PaymentField, PurchaseForm};
use sama_core::store::{products, purchases, suppliers};
use sama_core::totals::PurchaseTotals;
use serde::Serialize;
use std::sync::MutexGuard;
use tauri::AppHandle;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub form: PurchaseForm,
    pub totals: PurchaseTotals,
}

impl FormView {
    fn of(form: &PurchaseForm) -> Self {
        FormView {
            form: form.clone(),
            totals: form.totals(),
        }
    }
}

fn lock_form(app: &AppHandle) -> Result<MutexGuard<'_, PurchaseForm>, String> {
    app.purchase_form().form.lock().map_err(|e| e.to_string())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tauri::command]
pub fn get_purchase_form(app: AppHandle) -> Result<FormView, String> {
    let form = lock_form(&app)?;
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn reset_purchase_form(app: AppHandle) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    *form = PurchaseForm::new(today());
    Ok(FormView::of(&form))
}

/// Loads a saved purchase into the form for editing.
#[tauri::command]
pub fn edit_purchase(app: AppHandle, id: i64) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let purchase = purchases::get_purchase(&conn, id).map_err(|e| e.to_string())?;
    *form = PurchaseForm::from_purchase(&purchase);
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn set_form_header(
    app: AppHandle,
    reference: String,
    purchase_date: NaiveDate,
    notes: Option<String>,
) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.reference = reference;
    form.purchase_date = purchase_date;
    form.notes = notes.filter(|n| !n.trim().is_empty());
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn set_form_supplier(app: AppHandle, supplier_id: i64) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let supplier = suppliers::get_supplier(&conn, supplier_id).map_err(|e| e.to_string())?;
    form.set_supplier(supplier.id, supplier.name);
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn add_form_item(app: AppHandle) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.add_item();
    Ok(FormView::of(&form))
}

/// Adds a row already filled from the catalog, optionally with its depot.
#[tauri::command]
pub fn add_form_product(
    app: AppHandle,
    product_id: i64,
    quantity: Option<i64>,
    depot: Option<String>,
) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let product = products::get_product(&conn, product_id).map_err(|e| e.to_string())?;
    form.add_item_with(|item| {
        item.product_id = product.id;
        item.product_name = product.name.clone();
        item.unit_price = product.purchase_price;
        item.sell_price = product.sell_price;
        item.quantity = quantity.unwrap_or(1);
        item.depot = depot.unwrap_or_default();
    });
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn remove_form_item(app: AppHandle, index: usize) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.remove_item(index).map_err(|e| e.to_string())?;
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn update_form_item(
    app: AppHandle,
    index: usize,
    field: ItemField,
    value: FieldValue,
) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.update_item(index, field, value).map_err(|e| e.to_string())?;
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn select_form_product(app: AppHandle, index: usize, product_id: i64) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    let db = app.db();
    let conn = db.conn.lock().map_err(|e| e.to_string())?;

    let product = products::get_product(&conn, product_id).map_err(|e| e.to_string())?;
    form.select_product(index, &product).map_err(|e| e.to_string())?;
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn add_form_payment(
    app: AppHandle,
    method: PaymentMethodKind,
    amount: i64,
    date: Option<NaiveDate>,
) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.add_payment(method, amount, date.unwrap_or_else(today));
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn remove_form_payment(app: AppHandle, index: usize) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.remove_payment(index).map_err(|e| e.to_string())?;
    Ok(FormView::of(&form))
}

#[tauri::command]
pub fn update_form_payment(
    app: AppHandle,
    index: usize,
    field: PaymentField,
    value: FieldValue,
) -> Result<FormView, String> {
    let mut form = lock_form(&app)?;
    form.update_payment(index, field, value).map_err(|e| e.to_string())?;
    Ok(FormView::of(&form))
}

/// Saves the form as a new purchase, or over the one being edited, then
/// clears it. The form is kept as is when saving fails.
#[tauri::command]
pub fn submit_purchase_form(app: AppHandle) -> Result<Purchase, String> {
    let mut form = lock_form(&app)?;
    let db = app.db();
    let mut conn = db.conn.lock().map_err(|e| e.to_string())?;

    let editing_id = form.editing_id;
    let purchase = form.clone().into_purchase().map_err(|e| e.to_string())?;
    let saved = match editing_id {
        Some(id) => purchases::update_purchase(&mut conn, id, &purchase),
        None => purchases::create_purchase(&mut conn, &purchase),
    }
    .map_err(|e| e.to_string())?;

    *form = PurchaseForm::new(today());
    tracing::info!(id = saved.id, reference = %saved.reference, "purchase form submitted");
    Ok(saved)
}
