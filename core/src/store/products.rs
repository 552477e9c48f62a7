use crate::error::{Error, Result};
use crate::models::{Category, CreateProduct, Product};
use crate::store::{count, unique_violation};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument, warn};
use validator::Validate;

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.reference, p.category_id, c.name, p.purchase_price,
     p.sell_price, p.low_stock_threshold, p.created_at";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        reference: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        purchase_price: row.get(5)?,
        sell_price: row.get(6)?,
        low_stock_threshold: row.get(7)?,
        created_at: row.get(8)?,
    })
}

// ===== CATEGORIES =====

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;

    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

pub fn create_category(conn: &Connection, name: &str) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Le nom de la catégorie est obligatoire"));
    }

    conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])
        .map_err(|e| unique_violation(e, format!("La catégorie {name} existe déjà")))?;

    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn delete_category(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;

    // Products of this category become uncategorised
    tx.execute(
        "UPDATE products SET category_id = NULL WHERE category_id = ?1",
        [id],
    )?;
    tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;

    tx.commit()?;
    Ok(())
}

// ===== PRODUCTS =====

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS}
         FROM products p
         LEFT JOIN categories c ON p.category_id = c.id
         ORDER BY p.name"
    ))?;

    let products = stmt
        .query_map([], product_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(products)
}

pub fn get_product(conn: &Connection, id: i64) -> Result<Product> {
    conn.query_row(
        &format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products p
             LEFT JOIN categories c ON p.category_id = c.id
             WHERE p.id = ?1"
        ),
        [id],
        product_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::not_found("Produit", id))
}

/// Case-insensitive match on name or reference, for the cashier search box.
pub fn search_products(conn: &Connection, query: &str) -> Result<Vec<Product>> {
    let pattern = format!("%{}%", query.trim());
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS}
         FROM products p
         LEFT JOIN categories c ON p.category_id = c.id
         WHERE p.name LIKE ?1 OR p.reference LIKE ?1
         ORDER BY p.name
         LIMIT 50"
    ))?;

    let products = stmt
        .query_map([pattern], product_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(products)
}

#[instrument(skip(conn, product), fields(name = %product.name))]
pub fn create_product(conn: &Connection, product: &CreateProduct) -> Result<Product> {
    product.validate()?;

    conn.execute(
        "INSERT INTO products (name, reference, category_id, purchase_price, sell_price, low_stock_threshold)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            product.name.trim(),
            blank_to_none(product.reference.as_deref()),
            product.category_id,
            product.purchase_price,
            product.sell_price,
            product.low_stock_threshold.unwrap_or(5),
        ],
    )
    .map_err(|e| unique_violation(e, "Cette référence produit existe déjà".to_string()))?;

    let id = conn.last_insert_rowid();
    info!(id, "product created");
    get_product(conn, id)
}

#[instrument(skip(conn, product))]
pub fn update_product(conn: &Connection, id: i64, product: &CreateProduct) -> Result<Product> {
    product.validate()?;

    let changed = conn
        .execute(
            "UPDATE products SET name = ?1, reference = ?2, category_id = ?3, purchase_price = ?4,
             sell_price = ?5, low_stock_threshold = ?6
             WHERE id = ?7",
            rusqlite::params![
                product.name.trim(),
                blank_to_none(product.reference.as_deref()),
                product.category_id,
                product.purchase_price,
                product.sell_price,
                product.low_stock_threshold.unwrap_or(5),
                id,
            ],
        )
        .map_err(|e| unique_violation(e, "Cette référence produit existe déjà".to_string()))?;

    if changed == 0 {
        return Err(Error::not_found("Produit", id));
    }
    get_product(conn, id)
}

pub fn delete_product(conn: &Connection, id: i64) -> Result<()> {
    let used = count(conn, "SELECT COUNT(*) FROM purchase_items WHERE product_id = ?1", id)?
        + count(conn, "SELECT COUNT(*) FROM invoice_items WHERE product_id = ?1", id)?
        + count(
            conn,
            "SELECT COUNT(*) FROM inventory WHERE product_id = ?1 AND quantity <> 0",
            id,
        )?;

    if used > 0 {
        warn!(id, "refusing to delete product in use");
        return Err(Error::Conflict(
            "Impossible de supprimer un produit utilisé dans des documents ou en stock".to_string(),
        ));
    }

    conn.execute("DELETE FROM inventory WHERE product_id = ?1", [id])?;
    conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
    Ok(())
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
