//! Business rules and storage for SAMA MAGASIN.
//!
//! Everything here works on a plain [`rusqlite::Connection`] so the desktop
//! shell and the tests share the same code paths.

pub mod balances;
pub mod db;
pub mod error;
pub mod inventory;
pub mod models;
pub mod payments;
pub mod printing;
pub mod purchase_form;
pub mod settings;
pub mod store;
pub mod totals;

#[cfg(test)]
mod tests;

pub use db::Database;
pub use error::{Error, Result};
