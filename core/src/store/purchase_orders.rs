use crate::error::{Error, Result};
use crate::models::{
    NewPurchase, NewPurchaseOrder, Purchase, PurchaseItem, PurchaseOrder, PurchaseOrderItem,
    PurchaseOrderStatus,
};
use crate::purchase_form::check_new_purchase;
use crate::store::{next_number, purchases, suppliers};
use crate::totals;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, instrument};

const HEADER_QUERY: &str =
    "SELECT o.id, o.reference, o.supplier_id, s.name, o.order_date, o.status, o.purchase_id, o.created_at
     FROM purchase_orders o
     LEFT JOIN suppliers s ON o.supplier_id = s.id";

fn order_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PurchaseOrder> {
    Ok(PurchaseOrder {
        id: row.get(0)?,
        reference: row.get(1)?,
        supplier_id: row.get(2)?,
        supplier_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        order_date: row.get(4)?,
        status: row.get(5)?,
        purchase_id: row.get(6)?,
        created_at: row.get(7)?,
        items: Vec::new(),
        total_amount: 0,
    })
}

fn with_items(conn: &Connection, mut order: PurchaseOrder) -> Result<PurchaseOrder> {
    let mut stmt = conn.prepare_cached(
        "SELECT product_id, product_name, quantity, unit_price, sell_price
         FROM purchase_order_items WHERE order_id = ?1 ORDER BY id",
    )?;

    order.items = stmt
        .query_map([order.id], |row| {
            Ok(PurchaseOrderItem {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
                sell_price: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    order.total_amount = totals::total_amount(&order.items);

    Ok(order)
}

pub fn get_purchase_order(conn: &Connection, id: i64) -> Result<PurchaseOrder> {
    let order = conn
        .query_row(&format!("{HEADER_QUERY} WHERE o.id = ?1"), [id], order_from_row)
        .optional()?
        .ok_or_else(|| Error::not_found("Bon de commande", id))?;
    with_items(conn, order)
}

pub fn list_purchase_orders(
    conn: &Connection,
    status: Option<PurchaseOrderStatus>,
) -> Result<Vec<PurchaseOrder>> {
    let mut stmt = conn.prepare(&format!(
        "{HEADER_QUERY}
         WHERE ?1 IS NULL OR o.status = ?1
         ORDER BY o.order_date DESC, o.id DESC"
    ))?;

    let orders = stmt
        .query_map([status], order_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    orders.into_iter().map(|o| with_items(conn, o)).collect()
}

#[instrument(skip(conn, order))]
pub fn create_purchase_order(conn: &mut Connection, order: &NewPurchaseOrder) -> Result<PurchaseOrder> {
    if order.items.is_empty() {
        return Err(Error::validation("Ajoutez au moins un article"));
    }
    for (index, item) in order.items.iter().enumerate() {
        if item.product_id <= 0 || item.quantity <= 0 || item.unit_price <= 0 {
            return Err(Error::validation(format!(
                "Ligne {} : produit, quantité et prix sont obligatoires",
                index + 1
            )));
        }
        totals::check_quantity(index + 1, item.quantity)?;
        totals::check_price(index + 1, "le prix unitaire", item.unit_price)?;
        totals::check_price(index + 1, "le prix de vente", item.sell_price)?;
    }

    let tx = conn.transaction()?;
    suppliers::get_supplier(&tx, order.supplier_id)?;

    let reference = next_number(&tx, "purchase_orders", "reference", "BC", order.order_date)?;
    tx.execute(
        "INSERT INTO purchase_orders (reference, supplier_id, order_date, status) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            reference,
            order.supplier_id,
            order.order_date,
            PurchaseOrderStatus::Pending,
        ],
    )?;
    let id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO purchase_order_items (order_id, product_id, product_name, quantity, unit_price, sell_price)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for item in &order.items {
            stmt.execute(rusqlite::params![
                id,
                item.product_id,
                item.product_name,
                item.quantity,
                item.unit_price,
                item.sell_price,
            ])?;
        }
    }
    tx.commit()?;

    info!(id, reference = %reference, "purchase order created");
    get_purchase_order(conn, id)
}

fn ensure_pending(order: &PurchaseOrder) -> Result<()> {
    match order.status {
        PurchaseOrderStatus::Pending => Ok(()),
        PurchaseOrderStatus::Received => Err(Error::Conflict(format!(
            "Le bon de commande {} a déjà été réceptionné",
            order.reference
        ))),
        PurchaseOrderStatus::Cancelled => Err(Error::Conflict(format!(
            "Le bon de commande {} est annulé",
            order.reference
        ))),
    }
}

pub fn cancel_purchase_order(conn: &Connection, id: i64) -> Result<PurchaseOrder> {
    let order = get_purchase_order(conn, id)?;
    ensure_pending(&order)?;

    conn.execute(
        "UPDATE purchase_orders SET status = ?1 WHERE id = ?2",
        rusqlite::params![PurchaseOrderStatus::Cancelled, id],
    )?;
    info!(id, "purchase order cancelled");
    get_purchase_order(conn, id)
}

/// Books the delivery of an order as a purchase, every line into `depot`.
#[instrument(skip(conn))]
pub fn receive_purchase_order(
    conn: &mut Connection,
    id: i64,
    depot: &str,
    received_on: NaiveDate,
) -> Result<Purchase> {
    let tx = conn.transaction()?;
    let order = get_purchase_order(&tx, id)?;
    ensure_pending(&order)?;

    let purchase = NewPurchase {
        reference: order.reference.clone(),
        purchase_date: received_on,
        supplier_id: order.supplier_id,
        items: order
            .items
            .iter()
            .map(|item| PurchaseItem {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                sell_price: item.sell_price,
                depot: depot.to_string(),
            })
            .collect(),
        payment_methods: Vec::new(),
        notes: Some(format!("Réception du bon de commande {}", order.reference)),
    };
    check_new_purchase(&purchase)?;

    let purchase_id = purchases::insert_purchase(&tx, &purchase)?;
    tx.execute(
        "UPDATE purchase_orders SET status = ?1, purchase_id = ?2 WHERE id = ?3",
        rusqlite::params![PurchaseOrderStatus::Received, purchase_id, id],
    )?;
    tx.commit()?;

    info!(id, purchase_id, depot, "purchase order received");
    purchases::get_purchase(conn, purchase_id)
}
