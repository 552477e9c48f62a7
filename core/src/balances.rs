use crate::models::{
    AccountTotals, Client, ClientSummary, Invoice, Purchase, Supplier, SupplierSummary,
};
use crate::totals::PaymentStatus;

/// Sum of the balances of every purchase made from `supplier_id`.
pub fn calculate_supplier_balance(purchases: &[Purchase], supplier_id: i64) -> i64 {
    purchases
        .iter()
        .filter(|p| p.supplier_id == supplier_id)
        .map(|p| p.balance)
        .sum()
}

pub fn calculate_supplier_totals(purchases: &[Purchase], supplier_id: i64) -> AccountTotals {
    account_totals(
        purchases
            .iter()
            .filter(|p| p.supplier_id == supplier_id)
            .map(|p| (p.total_amount, p.total_paid)),
    )
}

pub fn calculate_client_balance(invoices: &[Invoice], client_id: i64) -> i64 {
    invoices
        .iter()
        .filter(|i| i.client_id == Some(client_id))
        .map(|i| i.balance)
        .sum()
}

pub fn calculate_client_totals(invoices: &[Invoice], client_id: i64) -> AccountTotals {
    account_totals(
        invoices
            .iter()
            .filter(|i| i.client_id == Some(client_id))
            .map(|i| (i.total_amount, i.total_paid)),
    )
}

fn account_totals(documents: impl Iterator<Item = (i64, i64)>) -> AccountTotals {
    let (total_invoice, total_paid) = documents
        .fold((0, 0), |(invoiced, paid), (amount, settled)| {
            (invoiced + amount, paid + settled)
        });
    let balance = total_invoice - total_paid;

    AccountTotals {
        total_invoice,
        total_paid,
        balance,
        status: PaymentStatus::from_balance(balance),
    }
}

pub fn summarize_suppliers(suppliers: Vec<Supplier>, purchases: &[Purchase]) -> Vec<SupplierSummary> {
    suppliers
        .into_iter()
        .map(|supplier| {
            let account = calculate_supplier_totals(purchases, supplier.id);
            SupplierSummary { supplier, account }
        })
        .collect()
}

pub fn summarize_clients(clients: Vec<Client>, invoices: &[Invoice]) -> Vec<ClientSummary> {
    clients
        .into_iter()
        .map(|client| {
            let account = calculate_client_totals(invoices, client.id);
            ClientSummary { client, account }
        })
        .collect()
}
