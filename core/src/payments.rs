use crate::error::{Error, Result};
use crate::models::{NewPayment, PaymentMethod};
use crate::totals::{DocumentTotals, PaymentStatus, MAX_AMOUNT};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethodKind {
    Cash,
    Wave,
    OrangeMoney,
    Cheque,
    Bank,
}

impl PaymentMethodKind {
    pub const ALL: [PaymentMethodKind; 5] = [
        PaymentMethodKind::Cash,
        PaymentMethodKind::Wave,
        PaymentMethodKind::OrangeMoney,
        PaymentMethodKind::Cheque,
        PaymentMethodKind::Bank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::Cash => "cash",
            PaymentMethodKind::Wave => "wave",
            PaymentMethodKind::OrangeMoney => "orangeMoney",
            PaymentMethodKind::Cheque => "cheque",
            PaymentMethodKind::Bank => "bank",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethodKind::Cash => "Espèces",
            PaymentMethodKind::Wave => "Wave",
            PaymentMethodKind::OrangeMoney => "Orange Money",
            PaymentMethodKind::Cheque => "Chèque",
            PaymentMethodKind::Bank => "Virement bancaire",
        }
    }
}

impl fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PaymentMethodKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::validation(format!("Mode de paiement inconnu : {s}")))
    }
}

impl ToSql for PaymentMethodKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PaymentMethodKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

/// Anything that carries a paid amount.
pub trait Payment {
    fn method(&self) -> PaymentMethodKind;
    fn amount(&self) -> i64;
}

impl Payment for PaymentMethod {
    fn method(&self) -> PaymentMethodKind {
        self.method
    }

    fn amount(&self) -> i64 {
        self.amount
    }
}

impl Payment for NewPayment {
    fn method(&self) -> PaymentMethodKind {
        self.method
    }

    fn amount(&self) -> i64 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_paid: i64,
    pub balance: i64,
    pub status: PaymentStatus,
}

/// Reconciles a document total against its payments.
pub fn allocate<P: Payment>(total_amount: i64, payments: &[P]) -> PaymentSummary {
    let totals = DocumentTotals::from_amounts(total_amount, crate::totals::total_paid(payments));
    PaymentSummary {
        total_paid: totals.total_paid,
        balance: totals.balance,
        status: totals.status,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodTotal {
    pub method: PaymentMethodKind,
    pub label: String,
    pub amount: i64,
}

/// Sum per payment method, in the fixed method order, skipping unused ones.
pub fn breakdown<P: Payment>(payments: &[P]) -> Vec<MethodTotal> {
    PaymentMethodKind::ALL
        .into_iter()
        .filter_map(|method| {
            let amount: i64 = payments
                .iter()
                .filter(|p| p.method() == method)
                .map(Payment::amount)
                .sum();
            let used = payments.iter().any(|p| p.method() == method);
            used.then(|| MethodTotal {
                method,
                label: method.label().to_string(),
                amount,
            })
        })
        .collect()
}

pub fn check_payment_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::validation("Le montant du paiement doit être supérieur à 0"));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::validation(format!(
            "Le montant du paiement ne peut pas dépasser {MAX_AMOUNT} FCFA"
        )));
    }
    Ok(())
}
