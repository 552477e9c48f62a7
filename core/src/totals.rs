//! Derived amounts for purchases and sales documents.
//!
//! Amounts are whole FCFA, so `i64` arithmetic is exact. Nothing in here is
//! stored: totals, balance and status are recomputed from the lines and
//! payments every time a document is read or edited.
//!
//! Saved documents never exceed [`MAX_QUANTITY`] and [`MAX_AMOUNT`]. The form
//! can hold anything the user types, so totals saturate instead of wrapping.

use crate::error::{Error, Result};
use crate::payments::Payment;
use serde::{Deserialize, Serialize};

/// Largest quantity accepted on a line.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest unit price or payment accepted, in FCFA.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

pub fn check_quantity(line: usize, quantity: i64) -> Result<()> {
    if quantity > MAX_QUANTITY {
        return Err(Error::validation(format!(
            "Ligne {line} : la quantité ne peut pas dépasser {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

/// `what` names the price in the message, e.g. "le prix unitaire".
pub fn check_price(line: usize, what: &str, amount: i64) -> Result<()> {
    if amount > MAX_AMOUNT {
        return Err(Error::validation(format!(
            "Ligne {line} : {what} ne peut pas dépasser {MAX_AMOUNT} FCFA"
        )));
    }
    Ok(())
}

/// Settlement state of a purchase, an invoice or an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "payée")]
    Paid,
    #[serde(rename = "impayée")]
    Unpaid,
}

impl PaymentStatus {
    pub fn from_balance(balance: i64) -> Self {
        if balance <= 0 {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "payée",
            PaymentStatus::Unpaid => "impayée",
        }
    }
}

/// A document line with a quantity and a unit price.
pub trait LineItem {
    fn quantity(&self) -> i64;
    fn unit_price(&self) -> i64;

    fn line_total(&self) -> i64 {
        self.quantity().saturating_mul(self.unit_price())
    }
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

pub fn total_amount<T: LineItem>(items: &[T]) -> i64 {
    saturating_sum(items.iter().map(LineItem::line_total))
}

pub fn total_paid<P: Payment>(payments: &[P]) -> i64 {
    saturating_sum(payments.iter().map(Payment::amount))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub total_amount: i64,
    pub total_paid: i64,
    pub balance: i64,
    pub status: PaymentStatus,
}

impl DocumentTotals {
    pub fn compute<T: LineItem, P: Payment>(items: &[T], payments: &[P]) -> Self {
        Self::from_amounts(total_amount(items), total_paid(payments))
    }

    pub fn from_amounts(total_amount: i64, total_paid: i64) -> Self {
        let balance = total_amount.saturating_sub(total_paid);
        DocumentTotals {
            total_amount,
            total_paid,
            balance,
            status: PaymentStatus::from_balance(balance),
        }
    }
}

/// Totals shown live on the purchase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTotals {
    #[serde(flatten)]
    pub document: DocumentTotals,
    /// What the purchased lines are worth at their sell price.
    pub sale_value: i64,
    pub margin: i64,
}

impl PurchaseTotals {
    pub fn compute<P: Payment>(items: &[crate::models::PurchaseItem], payments: &[P]) -> Self {
        let document = DocumentTotals::compute(items, payments);
        let sale_value =
            saturating_sum(items.iter().map(|i| i.quantity.saturating_mul(i.sell_price)));
        PurchaseTotals {
            document,
            sale_value,
            margin: sale_value.saturating_sub(document.total_amount),
        }
    }
}
