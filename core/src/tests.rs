//! Integration tests for the stores.
//! Each test runs against a fresh in-memory SQLite database with the real schema.

use crate::db;
use crate::error::Error;
use crate::inventory;
use crate::models::*;
use crate::payments::PaymentMethodKind;
use crate::purchase_form::{FieldValue, ItemField, PurchaseForm};
use crate::settings;
use crate::store::{
    clients, invoices, products, proformas, purchase_orders, purchases, reports,
    settings as settings_store, suppliers,
};
use crate::totals::{DocumentTotals, PaymentStatus};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::collections::HashMap;

fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    db::initialize(&conn).expect("Failed to create schema");
    conn
}

struct Seed {
    supplier_id: i64,
    client_id: i64,
    riz: i64,
    huile: i64,
}

fn seed_test_data(conn: &Connection) -> Seed {
    let category = products::create_category(conn, "Alimentation").unwrap();

    let riz = products::create_product(
        conn,
        &CreateProduct {
            name: "Riz parfumé 25kg".to_string(),
            reference: Some("RIZ-25".to_string()),
            category_id: Some(category.id),
            purchase_price: 12500,
            sell_price: 14000,
            low_stock_threshold: Some(3),
        },
    )
    .unwrap();

    let huile = products::create_product(
        conn,
        &CreateProduct {
            name: "Huile 5L".to_string(),
            reference: Some("HUI-5".to_string()),
            category_id: Some(category.id),
            purchase_price: 4000,
            sell_price: 4800,
            low_stock_threshold: None,
        },
    )
    .unwrap();

    let supplier = suppliers::create_supplier(
        conn,
        &SupplierInput {
            name: "Sénégal Distribution".to_string(),
            contact: Some("Moussa".to_string()),
            phone: Some("77 000 00 00".to_string()),
            email: None,
            address: Some("Dakar".to_string()),
        },
    )
    .unwrap();

    let client = clients::create_client(
        conn,
        &ClientInput {
            name: "Awa Diop".to_string(),
            phone: None,
            email: Some("awa@example.com".to_string()),
            address: None,
        },
    )
    .unwrap();

    Seed {
        supplier_id: supplier.id,
        client_id: client.id,
        riz: riz.id,
        huile: huile.id,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn line(product_id: i64, name: &str, quantity: i64, unit_price: i64, depot: &str) -> PurchaseItem {
    PurchaseItem {
        product_id,
        product_name: name.to_string(),
        quantity,
        unit_price,
        sell_price: unit_price + 1000,
        depot: depot.to_string(),
    }
}

fn payment(method: PaymentMethodKind, amount: i64, on: &str) -> NewPayment {
    NewPayment {
        method,
        amount,
        date: date(on),
    }
}

fn new_purchase(seed: &Seed, reference: &str) -> NewPurchase {
    NewPurchase {
        reference: reference.to_string(),
        purchase_date: date("2024-03-01"),
        supplier_id: seed.supplier_id,
        items: vec![
            line(seed.riz, "Riz parfumé 25kg", 10, 12500, "Dépôt Central"),
            line(seed.huile, "Huile 5L", 20, 4000, "Dépôt Nord"),
        ],
        payment_methods: vec![payment(PaymentMethodKind::Cash, 100000, "2024-03-01")],
        notes: None,
    }
}

fn sale_line(product_id: i64, quantity: i64, unit_price: i64, depot: Option<&str>) -> InvoiceItem {
    InvoiceItem {
        product_id,
        product_name: format!("Produit {product_id}"),
        quantity,
        unit_price,
        depot: depot.map(str::to_string),
    }
}

// ===== SCHEMA TESTS =====

#[test]
fn test_initialize_is_idempotent() {
    let conn = setup_test_db();
    db::initialize(&conn).unwrap();

    let has_notes: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('purchases') WHERE name = 'notes'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(has_notes, 1);
}

#[test]
fn test_database_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("sama_magasin.db");

    {
        let database = db::Database::open(&path).unwrap();
        let conn = database.conn.lock().unwrap();
        seed_test_data(&conn);
    }

    let database = db::Database::open(&path).unwrap();
    let conn = database.conn.lock().unwrap();
    assert_eq!(products::list_products(&conn).unwrap().len(), 2);
    assert_eq!(suppliers::list_suppliers(&conn).unwrap().len(), 1);
}

// ===== CATALOG TESTS =====

#[test]
fn test_duplicate_product_reference_is_a_conflict() {
    let conn = setup_test_db();
    seed_test_data(&conn);

    let result = products::create_product(
        &conn,
        &CreateProduct {
            name: "Autre riz".to_string(),
            reference: Some("RIZ-25".to_string()),
            category_id: None,
            purchase_price: 1,
            sell_price: 1,
            low_stock_threshold: None,
        },
    );
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[test]
fn test_product_validation_message() {
    let conn = setup_test_db();
    let result = products::create_product(
        &conn,
        &CreateProduct {
            name: String::new(),
            reference: None,
            category_id: None,
            purchase_price: 0,
            sell_price: 0,
            low_stock_threshold: None,
        },
    );
    match result {
        Err(Error::Validation(message)) => assert_eq!(message, "Le nom du produit est obligatoire"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_delete_category_uncategorises_products() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let category_id = products::get_product(&conn, seed.riz).unwrap().category_id.unwrap();

    products::delete_category(&mut conn, category_id).unwrap();

    let riz = products::get_product(&conn, seed.riz).unwrap();
    assert_eq!(riz.category_id, None);
    assert!(products::list_categories(&conn).unwrap().is_empty());
}

#[test]
fn test_search_products_matches_name_and_reference() {
    let conn = setup_test_db();
    seed_test_data(&conn);

    assert_eq!(products::search_products(&conn, "huile").unwrap().len(), 1);
    assert_eq!(products::search_products(&conn, "RIZ-").unwrap().len(), 1);
    assert!(products::search_products(&conn, "sucre").unwrap().is_empty());
}

#[test]
fn test_product_with_stock_cannot_be_deleted() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    assert!(matches!(
        products::delete_product(&conn, seed.riz),
        Err(Error::Conflict(_))
    ));
}

// ===== PURCHASE TESTS =====

#[test]
fn test_create_purchase_derives_totals() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let purchase = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    assert_eq!(purchase.total_amount, 10 * 12500 + 20 * 4000);
    assert_eq!(purchase.total_paid, 100000);
    assert_eq!(purchase.balance, 205000 - 100000);
    assert_eq!(purchase.status, PaymentStatus::Unpaid);
    assert_eq!(purchase.supplier_name, "Sénégal Distribution");
    assert_eq!(purchase.items.len(), 2);
    assert_eq!(purchase.payment_methods.len(), 1);
}

#[test]
fn test_purchase_fills_inventory_per_depot() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 10);
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Nord").unwrap(), 20);
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Nord").unwrap(), 0);
    assert_eq!(
        inventory::list_depots(&conn).unwrap(),
        vec!["Dépôt Central".to_string(), "Dépôt Nord".to_string()]
    );
}

#[test]
fn test_same_product_and_depot_merges_into_one_record() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-002")).unwrap();

    let records: Vec<_> = inventory::list_inventory(&conn, Some("Dépôt Central"))
        .unwrap()
        .into_iter()
        .filter(|r| r.product_id == seed.riz)
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quantity, 20);
    assert_eq!(inventory::stock_for_product(&conn, seed.riz).unwrap(), 20);
}

#[test]
fn test_duplicate_purchase_reference_is_rejected_without_stock_change() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();
    let result = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001"));

    match result {
        Err(Error::Conflict(message)) => assert!(message.contains("ACH-001")),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 10);
}

#[test]
fn test_purchase_with_unknown_supplier_is_not_found() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let mut purchase = new_purchase(&seed, "ACH-001");
    purchase.supplier_id = 999;

    assert!(matches!(
        purchases::create_purchase(&mut conn, &purchase),
        Err(Error::NotFound { entity: "Fournisseur", id: 999 })
    ));
    assert!(inventory::list_inventory(&conn, None).unwrap().is_empty());
}

#[test]
fn test_update_purchase_moves_stock() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let created = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    let mut edited = new_purchase(&seed, "ACH-001");
    edited.items = vec![line(seed.riz, "Riz parfumé 25kg", 4, 12500, "Dépôt Nord")];
    edited.payment_methods = vec![];
    let updated = purchases::update_purchase(&mut conn, created.id, &edited).unwrap();

    assert_eq!(updated.total_amount, 50000);
    assert_eq!(updated.total_paid, 0);
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 0);
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Nord").unwrap(), 4);
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Nord").unwrap(), 0);
}

#[test]
fn test_delete_purchase_reverts_stock() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let created = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    purchases::delete_purchase(&mut conn, created.id).unwrap();

    assert_eq!(inventory::stock_for_product(&conn, seed.riz).unwrap(), 0);
    assert!(matches!(
        purchases::get_purchase(&conn, created.id),
        Err(Error::NotFound { .. })
    ));
}

fn sell(conn: &mut Connection, product_id: i64, quantity: i64, depot: &str) {
    invoices::create_invoice(
        conn,
        &NewInvoice {
            client_id: None,
            issue_date: date("2024-03-05"),
            items: vec![sale_line(product_id, quantity, 14000, Some(depot))],
            payments: vec![],
            notes: None,
        },
    )
    .unwrap();
}

#[test]
fn test_delete_purchase_with_sold_stock_is_refused() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let created = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();
    sell(&mut conn, seed.riz, 10, "Dépôt Central");

    let result = purchases::delete_purchase(&mut conn, created.id);

    match result {
        Err(Error::InsufficientStock { requested, available, .. }) => {
            assert_eq!(requested, 10);
            assert_eq!(available, 0);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 0);
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Nord").unwrap(), 20);
    assert!(purchases::get_purchase(&conn, created.id).is_ok());
}

#[test]
fn test_update_purchase_checks_only_the_net_stock_change() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let created = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();
    sell(&mut conn, seed.riz, 4, "Dépôt Central");

    // Same quantities at a corrected price: nothing has to come back out.
    let mut repriced = new_purchase(&seed, "ACH-001");
    repriced.items[0].unit_price = 12000;
    let updated = purchases::update_purchase(&mut conn, created.id, &repriced).unwrap();
    assert_eq!(updated.total_amount, 200000);
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 6);

    // Dropping to 3 bags would leave -1 after the 4 already sold.
    let mut shrunk = new_purchase(&seed, "ACH-001");
    shrunk.items[0].quantity = 3;
    assert!(matches!(
        purchases::update_purchase(&mut conn, created.id, &shrunk),
        Err(Error::InsufficientStock { .. })
    ));
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 6);
    assert_eq!(purchases::get_purchase(&conn, created.id).unwrap().items[0].quantity, 10);
}

#[test]
fn test_purchase_with_huge_amounts_is_rejected() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let mut purchase = new_purchase(&seed, "ACH-001");
    purchase.items[0].quantity = 10_000_000_000;
    purchase.items[0].unit_price = 10_000_000_000;
    let err = purchases::create_purchase(&mut conn, &purchase).unwrap_err();
    assert_eq!(err.to_string(), "Ligne 1 : la quantité ne peut pas dépasser 1000000");

    let mut purchase = new_purchase(&seed, "ACH-001");
    purchase.payment_methods[0].amount = i64::MAX;
    assert!(matches!(
        purchases::create_purchase(&mut conn, &purchase),
        Err(Error::Validation(_))
    ));
    assert!(inventory::list_inventory(&conn, None).unwrap().is_empty());
}

#[test]
fn test_purchase_payments_settle_balance() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let created = purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    let paid = purchases::add_purchase_payment(
        &conn,
        created.id,
        &payment(PaymentMethodKind::Wave, created.balance, "2024-03-05"),
    )
    .unwrap();
    assert_eq!(paid.balance, 0);
    assert_eq!(paid.status, PaymentStatus::Paid);

    let wave_id = paid
        .payment_methods
        .iter()
        .find(|p| p.method == PaymentMethodKind::Wave)
        .unwrap()
        .id;
    let reopened = purchases::remove_purchase_payment(&conn, wave_id).unwrap();
    assert_eq!(reopened.status, PaymentStatus::Unpaid);

    assert!(matches!(
        purchases::add_purchase_payment(
            &conn,
            created.id,
            &payment(PaymentMethodKind::Cash, 0, "2024-03-05")
        ),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_list_purchases_filters_on_derived_status() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();
    let mut settled = new_purchase(&seed, "ACH-002");
    settled.payment_methods = vec![payment(PaymentMethodKind::Bank, 205000, "2024-03-01")];
    purchases::create_purchase(&mut conn, &settled).unwrap();

    let paid = purchases::list_purchases(
        &conn,
        &PurchaseFilter {
            status: Some(PaymentStatus::Paid),
            ..PurchaseFilter::default()
        },
    )
    .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].reference, "ACH-002");
}

#[test]
fn test_purchase_form_submits_through_store() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let riz = products::get_product(&conn, seed.riz).unwrap();

    let mut form = PurchaseForm::new(date("2024-04-02"));
    form.reference = "ACH-FORM".to_string();
    form.set_supplier(seed.supplier_id, "Sénégal Distribution");
    form.select_product(0, &riz).unwrap();
    form.update_item(0, ItemField::Quantity, FieldValue::Number(3)).unwrap();
    form.update_item(0, ItemField::Depot, FieldValue::Text("Boutique".to_string()))
        .unwrap();

    let purchase = purchases::create_purchase(&mut conn, &form.into_purchase().unwrap()).unwrap();

    assert_eq!(purchase.total_amount, 3 * 12500);
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Boutique").unwrap(), 3);
}

// ===== SUPPLIER & CLIENT TESTS =====

#[test]
fn test_supplier_summary_from_purchases() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-002")).unwrap();

    let summary = suppliers::get_supplier_summary(&conn, seed.supplier_id).unwrap();
    assert_eq!(summary.account.total_invoice, 410000);
    assert_eq!(summary.account.total_paid, 200000);
    assert_eq!(summary.account.balance, 210000);
    assert_eq!(summary.account.status, PaymentStatus::Unpaid);

    let all = suppliers::list_supplier_summaries(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], summary);
}

#[test]
fn test_supplier_with_purchases_cannot_be_deleted() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    assert!(matches!(
        suppliers::delete_supplier(&conn, seed.supplier_id),
        Err(Error::Conflict(_))
    ));
}

#[test]
fn test_invalid_client_email_is_rejected() {
    let conn = setup_test_db();
    let result = clients::create_client(
        &conn,
        &ClientInput {
            name: "Client".to_string(),
            phone: None,
            email: Some("pas-un-email".to_string()),
            address: None,
        },
    );
    assert!(matches!(result, Err(Error::Validation(m)) if m == "Adresse e-mail invalide"));
}

#[test]
fn test_client_summary_from_invoices() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    invoices::create_invoice(
        &mut conn,
        &NewInvoice {
            client_id: Some(seed.client_id),
            issue_date: date("2024-03-10"),
            items: vec![sale_line(seed.riz, 2, 14000, None)],
            payments: vec![payment(PaymentMethodKind::OrangeMoney, 10000, "2024-03-10")],
            notes: None,
        },
    )
    .unwrap();

    let summary = clients::get_client_summary(&conn, seed.client_id).unwrap();
    assert_eq!(summary.account.total_invoice, 28000);
    assert_eq!(summary.account.balance, 18000);
}

// ===== INVOICE TESTS =====

#[test]
fn test_invoice_numbers_follow_the_year() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let invoice = |on: &str| NewInvoice {
        client_id: None,
        issue_date: date(on),
        items: vec![sale_line(seed.huile, 1, 4800, None)],
        payments: vec![],
        notes: None,
    };

    let first = invoices::create_invoice(&mut conn, &invoice("2024-01-15")).unwrap();
    let second = invoices::create_invoice(&mut conn, &invoice("2024-06-01")).unwrap();
    let next_year = invoices::create_invoice(&mut conn, &invoice("2025-01-02")).unwrap();

    assert_eq!(first.number, "FAC-2024-0001");
    assert_eq!(second.number, "FAC-2024-0002");
    assert_eq!(next_year.number, "FAC-2025-0001");
}

#[test]
fn test_invoice_takes_stock_from_depot() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    invoices::create_invoice(
        &mut conn,
        &NewInvoice {
            client_id: Some(seed.client_id),
            issue_date: date("2024-03-10"),
            items: vec![sale_line(seed.riz, 4, 14000, Some("Dépôt Central"))],
            payments: vec![],
            notes: None,
        },
    )
    .unwrap();

    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 6);
}

#[test]
fn test_insufficient_stock_rolls_back_invoice() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    let result = invoices::create_invoice(
        &mut conn,
        &NewInvoice {
            client_id: None,
            issue_date: date("2024-03-10"),
            items: vec![
                sale_line(seed.huile, 5, 4800, Some("Dépôt Nord")),
                sale_line(seed.riz, 11, 14000, Some("Dépôt Central")),
            ],
            payments: vec![],
            notes: None,
        },
    );

    match result {
        Err(Error::InsufficientStock { requested, available, .. }) => {
            assert_eq!(requested, 11);
            assert_eq!(available, 10);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Nord").unwrap(), 20);
    assert!(invoices::list_invoices(&conn, &InvoiceFilter::default()).unwrap().is_empty());
}

#[test]
fn test_delete_invoice_restores_stock() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    let invoice = invoices::create_invoice(
        &mut conn,
        &NewInvoice {
            client_id: None,
            issue_date: date("2024-03-10"),
            items: vec![sale_line(seed.huile, 5, 4800, Some("Dépôt Nord"))],
            payments: vec![],
            notes: None,
        },
    )
    .unwrap();
    invoices::delete_invoice(&mut conn, invoice.id).unwrap();

    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Nord").unwrap(), 20);
}

#[test]
fn test_record_sale_computes_change() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    let receipt = invoices::record_sale(
        &mut conn,
        &CashierSale {
            client_id: None,
            items: vec![sale_line(seed.huile, 2, 4800, Some("Dépôt Nord"))],
            payments: vec![
                payment(PaymentMethodKind::Cash, 5000, "2024-03-12"),
                payment(PaymentMethodKind::Wave, 4600, "2024-03-12"),
            ],
            amount_received: Some(10000),
        },
        date("2024-03-12"),
    )
    .unwrap();

    assert_eq!(receipt.change_due, 5000);
    assert_eq!(receipt.invoice.status, PaymentStatus::Paid);
    assert_eq!(receipt.invoice.issue_date, date("2024-03-12"));
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Nord").unwrap(), 18);
}

#[test]
fn test_record_sale_rejects_overpayment_and_short_cash() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let mut sale = CashierSale {
        client_id: None,
        items: vec![sale_line(seed.huile, 1, 4800, None)],
        payments: vec![payment(PaymentMethodKind::Cash, 5000, "2024-03-12")],
        amount_received: None,
    };
    assert!(matches!(
        invoices::record_sale(&mut conn, &sale, date("2024-03-12")),
        Err(Error::Validation(_))
    ));

    sale.payments = vec![payment(PaymentMethodKind::Cash, 4800, "2024-03-12")];
    sale.amount_received = Some(2000);
    assert!(matches!(
        invoices::record_sale(&mut conn, &sale, date("2024-03-12")),
        Err(Error::Validation(_))
    ));

    assert!(invoices::list_invoices(&conn, &InvoiceFilter::default()).unwrap().is_empty());
}

#[test]
fn test_record_sale_received_amount_needs_cash() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let sale = CashierSale {
        client_id: None,
        items: vec![sale_line(seed.huile, 1, 4800, None)],
        payments: vec![payment(PaymentMethodKind::Wave, 4800, "2024-03-12")],
        amount_received: Some(5000),
    };
    assert!(matches!(
        invoices::record_sale(&mut conn, &sale, date("2024-03-12")),
        Err(Error::Validation(_))
    ));

    let sale = CashierSale {
        amount_received: None,
        ..sale
    };
    let receipt = invoices::record_sale(&mut conn, &sale, date("2024-03-12")).unwrap();
    assert_eq!(receipt.change_due, 0);
    assert_eq!(receipt.invoice.status, PaymentStatus::Paid);
}

// ===== PROFORMA TESTS =====

fn new_proforma(seed: &Seed) -> NewProforma {
    NewProforma {
        client_id: Some(seed.client_id),
        issue_date: date("2024-05-02"),
        valid_until: Some(date("2024-05-31")),
        items: vec![ProformaItem {
            product_id: seed.riz,
            product_name: "Riz parfumé 25kg".to_string(),
            quantity: 5,
            unit_price: 13500,
        }],
    }
}

#[test]
fn test_proforma_converts_once() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let proforma = proformas::create_proforma(&mut conn, &new_proforma(&seed)).unwrap();
    assert_eq!(proforma.number, "PRO-2024-0001");
    assert_eq!(proforma.total_amount, 67500);
    assert_eq!(proforma.status, ProformaStatus::Draft);

    let sent = proformas::mark_proforma_sent(&conn, proforma.id).unwrap();
    assert_eq!(sent.status, ProformaStatus::Sent);

    let invoice =
        proformas::convert_to_invoice(&mut conn, proforma.id, date("2024-05-10"), None).unwrap();
    assert_eq!(invoice.total_amount, 67500);
    assert_eq!(invoice.proforma_id, Some(proforma.id));
    assert_eq!(invoice.client_id, Some(seed.client_id));

    let converted = proformas::get_proforma(&conn, proforma.id).unwrap();
    assert_eq!(converted.status, ProformaStatus::Converted);
    assert_eq!(converted.invoice_id, Some(invoice.id));

    assert!(matches!(
        proformas::convert_to_invoice(&mut conn, proforma.id, date("2024-05-11"), None),
        Err(Error::Conflict(_))
    ));
    assert!(matches!(
        proformas::delete_proforma(&conn, proforma.id),
        Err(Error::Conflict(_))
    ));
    assert_eq!(invoices::list_invoices(&conn, &InvoiceFilter::default()).unwrap().len(), 1);
}

#[test]
fn test_deleting_converted_invoice_reopens_proforma() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let proforma = proformas::create_proforma(&mut conn, &new_proforma(&seed)).unwrap();
    let invoice =
        proformas::convert_to_invoice(&mut conn, proforma.id, date("2024-05-10"), None).unwrap();

    invoices::delete_invoice(&mut conn, invoice.id).unwrap();

    let reopened = proformas::get_proforma(&conn, proforma.id).unwrap();
    assert_eq!(reopened.status, ProformaStatus::Sent);
    assert_eq!(reopened.invoice_id, None);
}

#[test]
fn test_proforma_converted_from_depot_takes_stock() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    purchases::create_purchase(&mut conn, &new_purchase(&seed, "ACH-001")).unwrap();

    let short = proformas::create_proforma(
        &mut conn,
        &NewProforma {
            items: vec![ProformaItem {
                product_id: seed.riz,
                product_name: "Riz parfumé 25kg".to_string(),
                quantity: 11,
                unit_price: 13500,
            }],
            ..new_proforma(&seed)
        },
    )
    .unwrap();
    let central = Some("Dépôt Central");
    assert!(matches!(
        proformas::convert_to_invoice(&mut conn, short.id, date("2024-05-10"), central),
        Err(Error::InsufficientStock { .. })
    ));
    assert_eq!(
        proformas::get_proforma(&conn, short.id).unwrap().status,
        ProformaStatus::Draft
    );

    let proforma = proformas::create_proforma(&mut conn, &new_proforma(&seed)).unwrap();
    let invoice =
        proformas::convert_to_invoice(&mut conn, proforma.id, date("2024-05-10"), central).unwrap();

    assert_eq!(invoice.items[0].depot.as_deref(), Some("Dépôt Central"));
    assert_eq!(inventory::quantity_at(&conn, seed.riz, "Dépôt Central").unwrap(), 5);
}

#[test]
fn test_proforma_validity_cannot_precede_issue() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let mut proforma = new_proforma(&seed);
    proforma.valid_until = Some(date("2024-04-01"));
    assert!(matches!(
        proformas::create_proforma(&mut conn, &proforma),
        Err(Error::Validation(_))
    ));
}

// ===== PURCHASE ORDER TESTS =====

fn new_order(seed: &Seed) -> NewPurchaseOrder {
    NewPurchaseOrder {
        supplier_id: seed.supplier_id,
        order_date: date("2024-02-20"),
        items: vec![PurchaseOrderItem {
            product_id: seed.huile,
            product_name: "Huile 5L".to_string(),
            quantity: 30,
            unit_price: 3900,
            sell_price: 4800,
        }],
    }
}

#[test]
fn test_receiving_order_books_purchase_into_depot() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let order = purchase_orders::create_purchase_order(&mut conn, &new_order(&seed)).unwrap();
    assert_eq!(order.reference, "BC-2024-0001");
    assert_eq!(order.status, PurchaseOrderStatus::Pending);
    assert_eq!(order.total_amount, 117000);

    let purchase =
        purchase_orders::receive_purchase_order(&mut conn, order.id, "Dépôt Sud", date("2024-02-25"))
            .unwrap();
    assert_eq!(purchase.reference, "BC-2024-0001");
    assert_eq!(purchase.total_amount, 117000);
    assert_eq!(purchase.status, PaymentStatus::Unpaid);
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Sud").unwrap(), 30);

    let received = purchase_orders::get_purchase_order(&conn, order.id).unwrap();
    assert_eq!(received.status, PurchaseOrderStatus::Received);
    assert_eq!(received.purchase_id, Some(purchase.id));

    assert!(matches!(
        purchase_orders::receive_purchase_order(&mut conn, order.id, "Dépôt Sud", date("2024-02-26")),
        Err(Error::Conflict(_))
    ));
    assert_eq!(inventory::quantity_at(&conn, seed.huile, "Dépôt Sud").unwrap(), 30);
}

#[test]
fn test_cancelled_order_cannot_be_received() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let order = purchase_orders::create_purchase_order(&mut conn, &new_order(&seed)).unwrap();

    purchase_orders::cancel_purchase_order(&conn, order.id).unwrap();

    assert!(matches!(
        purchase_orders::receive_purchase_order(&mut conn, order.id, "Dépôt Sud", date("2024-02-25")),
        Err(Error::Conflict(_))
    ));
    assert_eq!(
        purchase_orders::list_purchase_orders(&conn, Some(PurchaseOrderStatus::Cancelled))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_receiving_into_blank_depot_is_rejected() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);
    let order = purchase_orders::create_purchase_order(&mut conn, &new_order(&seed)).unwrap();

    assert!(matches!(
        purchase_orders::receive_purchase_order(&mut conn, order.id, "  ", date("2024-02-25")),
        Err(Error::Validation(_))
    ));
    let still_pending = purchase_orders::get_purchase_order(&conn, order.id).unwrap();
    assert_eq!(still_pending.status, PurchaseOrderStatus::Pending);
}

// ===== SETTINGS TESTS =====

#[test]
fn test_settings_round_trip_and_unknown_keys() {
    let mut conn = setup_test_db();

    let mut values = HashMap::new();
    values.insert(settings::COMPANY_NAME.to_string(), "Quincaillerie Ndiaye".to_string());
    values.insert(settings::AUTO_PRINT.to_string(), "true".to_string());
    settings_store::save_settings(&mut conn, &values).unwrap();

    let company = settings_store::company_settings(&conn).unwrap();
    assert_eq!(company.name, "Quincaillerie Ndiaye");
    assert_eq!(company.currency, "FCFA");
    assert!(company.auto_print);

    values.insert("theme".to_string(), "dark".to_string());
    assert!(matches!(
        settings_store::save_settings(&mut conn, &values),
        Err(Error::Validation(_))
    ));
    assert!(settings_store::get_settings(&conn).unwrap().get("theme").is_none());
}

#[test]
fn test_logo_is_loaded_from_disk() {
    let conn = setup_test_db();
    let dir = tempfile::tempdir().unwrap();

    let png = dir.path().join("logo.png");
    std::fs::write(&png, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
    let encoded = settings_store::load_logo(&conn, &png).unwrap();
    assert_eq!(
        settings_store::get_setting(&conn, settings::COMPANY_LOGO).unwrap(),
        Some(encoded)
    );

    let text = dir.path().join("logo.txt");
    std::fs::write(&text, "hello").unwrap();
    assert!(settings_store::load_logo(&conn, &text).is_err());

    settings_store::remove_logo(&conn).unwrap();
    assert!(settings_store::company_settings(&conn).unwrap().logo.is_none());
}

// ===== REPORT TESTS =====

#[test]
fn test_day_summary_splits_by_method() {
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    let older = invoices::create_invoice(
        &mut conn,
        &NewInvoice {
            client_id: Some(seed.client_id),
            issue_date: date("2024-03-11"),
            items: vec![sale_line(seed.riz, 1, 14000, None)],
            payments: vec![],
            notes: None,
        },
    )
    .unwrap();
    invoices::add_invoice_payment(
        &conn,
        older.id,
        &payment(PaymentMethodKind::Cheque, 14000, "2024-03-12"),
    )
    .unwrap();

    invoices::record_sale(
        &mut conn,
        &CashierSale {
            client_id: None,
            items: vec![sale_line(seed.huile, 3, 4800, None)],
            payments: vec![payment(PaymentMethodKind::Cash, 10000, "2024-03-12")],
            amount_received: None,
        },
        date("2024-03-12"),
    )
    .unwrap();

    let summary = reports::day_summary(&conn, date("2024-03-12")).unwrap();
    assert_eq!(summary.total_sales, 1);
    assert_eq!(summary.revenue, 14400);
    assert_eq!(summary.outstanding, 4400);
    assert_eq!(summary.collected, 24000);

    let methods: Vec<_> = summary.by_method.iter().map(|m| (m.method, m.amount)).collect();
    assert_eq!(
        methods,
        vec![(PaymentMethodKind::Cash, 10000), (PaymentMethodKind::Cheque, 14000)]
    );
}

#[test]
fn test_day_summary_of_quiet_day_is_empty() {
    let conn = setup_test_db();
    let summary = reports::day_summary(&conn, date("2024-01-01")).unwrap();

    assert_eq!(summary.total_sales, 0);
    assert_eq!(summary.revenue, 0);
    assert!(summary.by_method.is_empty());
}

// ===== PROPERTY TESTS =====

#[test]
fn test_stored_totals_match_line_arithmetic() {
    let mut rng = StdRng::seed_from_u64(0x5A4A);
    let mut conn = setup_test_db();
    let seed = seed_test_data(&conn);

    for round in 0..25 {
        let items: Vec<_> = (0..rng.gen_range(1..5))
            .map(|_| {
                let product = if rng.gen_bool(0.5) { seed.riz } else { seed.huile };
                line(
                    product,
                    "Article",
                    rng.gen_range(1..50),
                    rng.gen_range(100..20_000),
                    if rng.gen_bool(0.5) { "A" } else { "B" },
                )
            })
            .collect();
        let payments: Vec<_> = (0..rng.gen_range(0..3))
            .map(|_| payment(PaymentMethodKind::Cash, rng.gen_range(1..200_000), "2024-03-01"))
            .collect();

        let expected_total: i64 = items.iter().map(|i| i.quantity * i.unit_price).sum();
        let expected_paid: i64 = payments.iter().map(|p| p.amount).sum();

        let purchase = purchases::create_purchase(
            &mut conn,
            &NewPurchase {
                reference: format!("ACH-{round:03}"),
                purchase_date: date("2024-03-01"),
                supplier_id: seed.supplier_id,
                items,
                payment_methods: payments,
                notes: None,
            },
        )
        .unwrap();

        assert_eq!(purchase.total_amount, expected_total);
        assert_eq!(purchase.total_paid, expected_paid);
        assert_eq!(purchase.balance, expected_total - expected_paid);
        assert_eq!(
            purchase.status,
            DocumentTotals::from_amounts(expected_total, expected_paid).status
        );
    }

    let stock: i64 = inventory::list_inventory(&conn, None)
        .unwrap()
        .iter()
        .map(|r| r.quantity)
        .sum();
    let bought: i64 = purchases::list_purchases(&conn, &PurchaseFilter::default())
        .unwrap()
        .iter()
        .flat_map(|p| p.items.iter())
        .map(|i| i.quantity)
        .sum();
    assert_eq!(stock, bought);
}
