pub mod clients;
pub mod inventory;
pub mod invoices;
pub mod printing;
pub mod products;
pub mod proformas;
pub mod purchase_form;
pub mod purchase_orders;
pub mod purchases;
pub mod reports;
pub mod settings;
pub mod suppliers;
