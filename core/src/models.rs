use crate::error::{Error, Result};
use crate::payments::PaymentMethodKind;
use crate::totals::{LineItem, PaymentStatus};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ===== CATALOG =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub reference: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub purchase_price: i64,
    pub sell_price: i64,
    pub low_stock_threshold: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "Le nom du produit est obligatoire"))]
    pub name: String,
    pub reference: Option<String>,
    pub category_id: Option<i64>,
    #[validate(range(min = 0, message = "Le prix d'achat ne peut pas être négatif"))]
    pub purchase_price: i64,
    #[validate(range(min = 0, message = "Le prix de vente ne peut pas être négatif"))]
    pub sell_price: i64,
    #[validate(range(min = 0, message = "Le seuil d'alerte ne peut pas être négatif"))]
    pub low_stock_threshold: Option<i64>,
}

// ===== PARTNERS =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    #[validate(length(min = 1, message = "Le nom du fournisseur est obligatoire"))]
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Adresse e-mail invalide"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Account figures of a partner, always computed from its documents.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountTotals {
    pub total_invoice: i64,
    pub total_paid: i64,
    pub balance: i64,
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummary {
    #[serde(flatten)]
    pub supplier: Supplier,
    #[serde(flatten)]
    pub account: AccountTotals,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    #[validate(length(min = 1, message = "Le nom du client est obligatoire"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Adresse e-mail invalide"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    #[serde(flatten)]
    pub account: AccountTotals,
}

// ===== PAYMENTS =====

/// A payment recorded against a saved document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentMethod {
    pub id: i64,
    pub method: PaymentMethodKind,
    pub amount: i64,
    pub date: NaiveDate,
}

/// A payment not saved yet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewPayment {
    pub method: PaymentMethodKind,
    pub amount: i64,
    pub date: NaiveDate,
}

// ===== PURCHASES =====

/// One purchase line. A blank row has `product_id == 0`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub sell_price: i64,
    pub depot: String,
}

impl LineItem for PurchaseItem {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> i64 {
        self.unit_price
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i64,
    pub reference: String,
    pub purchase_date: NaiveDate,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub items: Vec<PurchaseItem>,
    pub total_amount: i64,
    pub total_paid: i64,
    pub balance: i64,
    pub status: PaymentStatus,
    pub payment_methods: Vec<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    pub reference: String,
    pub purchase_date: NaiveDate,
    pub supplier_id: i64,
    pub items: Vec<PurchaseItem>,
    pub payment_methods: Vec<NewPayment>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFilter {
    pub supplier_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ===== INVENTORY =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub depot: String,
    pub quantity: i64,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub low_stock_threshold: i64,
}

// ===== SALES =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    /// Stock is taken from this depot when set.
    pub depot: Option<String>,
}

impl LineItem for InvoiceItem {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> i64 {
        self.unit_price
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub number: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub issue_date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<PaymentMethod>,
    pub total_amount: i64,
    pub total_paid: i64,
    pub balance: i64,
    pub status: PaymentStatus,
    pub proforma_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub client_id: Option<i64>,
    pub issue_date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<NewPayment>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub client_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// A counter sale from the cashier screen.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashierSale {
    pub client_id: Option<i64>,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<NewPayment>,
    /// Cash handed over by the customer, when more than the cash due.
    pub amount_received: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub invoice: Invoice,
    pub change_due: i64,
}

// ===== PROFORMAS =====

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProformaStatus {
    Draft,
    Sent,
    Converted,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProformaItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

impl LineItem for ProformaItem {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> i64 {
        self.unit_price
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proforma {
    pub id: i64,
    pub number: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub items: Vec<ProformaItem>,
    pub total_amount: i64,
    pub status: ProformaStatus,
    pub invoice_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProforma {
    pub client_id: Option<i64>,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub items: Vec<ProformaItem>,
}

// ===== PURCHASE ORDERS =====

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Pending,
    Received,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub sell_price: i64,
}

impl LineItem for PurchaseOrderItem {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> i64 {
        self.unit_price
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: i64,
    pub reference: String,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub order_date: NaiveDate,
    pub items: Vec<PurchaseOrderItem>,
    pub total_amount: i64,
    pub status: PurchaseOrderStatus,
    pub purchase_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrder {
    pub supplier_id: i64,
    pub order_date: NaiveDate,
    pub items: Vec<PurchaseOrderItem>,
}

// ===== REPORTS =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_sales: i64,
    pub revenue: i64,
    pub collected: i64,
    pub outstanding: i64,
    pub by_method: Vec<crate::payments::MethodTotal>,
    pub invoices: Vec<Invoice>,
}

// Status columns are stored as their serde names.
macro_rules! sql_text_enum {
    ($ty:ty, $label:literal, { $($variant:path => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($variant),)+
                    other => Err(Error::validation(format!(concat!($label, " inconnu : {}"), other))),
                }
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_text_enum!(ProformaStatus, "Statut de proforma", {
    ProformaStatus::Draft => "draft",
    ProformaStatus::Sent => "sent",
    ProformaStatus::Converted => "converted",
});

sql_text_enum!(PurchaseOrderStatus, "Statut de bon de commande", {
    PurchaseOrderStatus::Pending => "pending",
    PurchaseOrderStatus::Received => "received",
    PurchaseOrderStatus::Cancelled => "cancelled",
});
