//! Printable HTML documents: depot entry slips, A4 invoices and proformas,
//! and the 80 mm cashier receipt.
//!
//! Documents are rendered from askama templates under `templates/`, so
//! every value is HTML-escaped. Opening and printing them is the shell's job.

use crate::error::{Error, Result};
use crate::models::{Invoice, Proforma, Purchase, PurchaseItem};
use crate::payments;
use crate::settings::CompanySettings;
use crate::totals::LineItem;
use askama::Template;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which depot slips to print for a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "depot")]
pub enum DepotSelection {
    All,
    Depot(String),
}

impl DepotSelection {
    pub fn from_option(depot: Option<String>) -> Self {
        match depot {
            Some(depot) if depot != "all" => DepotSelection::Depot(depot),
            _ => DepotSelection::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepotGroup<'a> {
    pub depot: &'a str,
    pub items: Vec<&'a PurchaseItem>,
}

/// Groups purchase lines by depot, in order of first appearance.
pub fn group_by_depot(items: &[PurchaseItem]) -> Vec<DepotGroup<'_>> {
    let mut groups: Vec<DepotGroup<'_>> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g.depot == item.depot) {
            Some(group) => group.items.push(item),
            None => groups.push(DepotGroup {
                depot: &item.depot,
                items: vec![item],
            }),
        }
    }
    groups
}

/// A rendered document and a name suitable for a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintedDocument {
    pub name: String,
    pub html: String,
}

/// `12500` -> `12 500 FCFA`
pub fn format_amount(amount: i64, currency: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} {currency}")
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

struct CompanyHeader {
    name: String,
    address: String,
    phone: String,
    email: String,
    logo: Option<String>,
}

impl CompanyHeader {
    fn new(company: &CompanySettings) -> Self {
        CompanyHeader {
            name: company.name.clone(),
            address: company.address.clone(),
            phone: company.phone.clone(),
            email: company.email.clone(),
            logo: company.logo_data_url(),
        }
    }
}

struct DocLine {
    product: String,
    quantity: i64,
    unit_price: String,
    total: String,
}

impl DocLine {
    fn new<T: LineItem>(product: &str, item: &T, currency: &str) -> Self {
        DocLine {
            product: product.to_string(),
            quantity: item.quantity(),
            unit_price: format_amount(item.unit_price(), currency),
            total: format_amount(item.line_total(), currency),
        }
    }
}

struct DepotSection {
    depot: String,
    lines: Vec<DocLine>,
    quantity: i64,
    total: String,
}

struct PaymentLine {
    label: String,
    date: String,
    amount: String,
}

#[derive(Template)]
#[template(path = "depot_slip.html")]
struct DepotSlipTemplate {
    title: String,
    company: CompanyHeader,
    auto_print: bool,
    reference: String,
    date: String,
    supplier: String,
    sections: Vec<DepotSection>,
    grand_total: String,
}

#[derive(Template)]
#[template(path = "invoice_a4.html")]
struct InvoiceTemplate {
    title: String,
    company: CompanyHeader,
    auto_print: bool,
    number: String,
    date: String,
    client: String,
    lines: Vec<DocLine>,
    total: String,
    payments: Vec<PaymentLine>,
    paid: String,
    balance: String,
    status: String,
}

#[derive(Template)]
#[template(path = "proforma_a4.html")]
struct ProformaTemplate {
    title: String,
    company: CompanyHeader,
    auto_print: bool,
    number: String,
    date: String,
    valid_until: Option<String>,
    client: String,
    lines: Vec<DocLine>,
    total: String,
}

#[derive(Template)]
#[template(path = "receipt_80mm.html")]
struct ReceiptTemplate {
    title: String,
    company: CompanyHeader,
    auto_print: bool,
    number: String,
    date: String,
    client: String,
    lines: Vec<DocLine>,
    total: String,
    payments: Vec<PaymentLine>,
    change_due: Option<String>,
    balance: Option<String>,
}

/// Entry slip for the depots receiving a purchase, one table per depot.
pub fn render_depot_slip(
    purchase: &Purchase,
    selection: &DepotSelection,
    company: &CompanySettings,
) -> Result<PrintedDocument> {
    let currency = company.currency.as_str();
    let groups: Vec<DepotGroup<'_>> = group_by_depot(&purchase.items)
        .into_iter()
        .filter(|g| match selection {
            DepotSelection::All => true,
            DepotSelection::Depot(depot) => g.depot == depot,
        })
        .collect();

    if groups.is_empty() {
        return Err(match selection {
            DepotSelection::Depot(depot) => {
                Error::validation(format!("Aucun article pour le dépôt {depot}"))
            }
            DepotSelection::All => Error::validation("Aucun article à imprimer"),
        });
    }

    let mut grand_total = 0;
    let sections = groups
        .iter()
        .map(|group| {
            let total: i64 = group.items.iter().map(|i| i.line_total()).sum();
            grand_total += total;
            DepotSection {
                depot: group.depot.to_string(),
                lines: group
                    .items
                    .iter()
                    .map(|item| DocLine::new(&item.product_name, *item, currency))
                    .collect(),
                quantity: group.items.iter().map(|i| i.quantity).sum(),
                total: format_amount(total, currency),
            }
        })
        .collect();

    let suffix = match selection {
        DepotSelection::All => "tous".to_string(),
        DepotSelection::Depot(depot) => depot.clone(),
    };
    let template = DepotSlipTemplate {
        title: format!("Bon d'entrée {}", purchase.reference),
        company: CompanyHeader::new(company),
        auto_print: company.auto_print,
        reference: purchase.reference.clone(),
        date: format_date(purchase.purchase_date),
        supplier: purchase.supplier_name.clone(),
        sections,
        grand_total: format_amount(grand_total, currency),
    };

    Ok(PrintedDocument {
        name: format!("bon-entree-{}-{}", purchase.reference, suffix),
        html: template.render()?,
    })
}

fn payment_lines(invoice: &Invoice, currency: &str) -> Vec<PaymentLine> {
    invoice
        .payments
        .iter()
        .map(|p| PaymentLine {
            label: p.method.label().to_string(),
            date: format_date(p.date),
            amount: format_amount(p.amount, currency),
        })
        .collect()
}

fn client_label(name: Option<&str>) -> String {
    name.unwrap_or("Client comptant").to_string()
}

pub fn render_invoice_a4(invoice: &Invoice, company: &CompanySettings) -> Result<PrintedDocument> {
    let currency = company.currency.as_str();
    let template = InvoiceTemplate {
        title: format!("Facture {}", invoice.number),
        company: CompanyHeader::new(company),
        auto_print: company.auto_print,
        number: invoice.number.clone(),
        date: format_date(invoice.issue_date),
        client: client_label(invoice.client_name.as_deref()),
        lines: invoice
            .items
            .iter()
            .map(|item| DocLine::new(&item.product_name, item, currency))
            .collect(),
        total: format_amount(invoice.total_amount, currency),
        payments: payment_lines(invoice, currency),
        paid: format_amount(invoice.total_paid, currency),
        balance: format_amount(invoice.balance.max(0), currency),
        status: invoice.status.as_str().to_string(),
    };

    Ok(PrintedDocument {
        name: format!("facture-{}", invoice.number),
        html: template.render()?,
    })
}

pub fn render_proforma_a4(proforma: &Proforma, company: &CompanySettings) -> Result<PrintedDocument> {
    let currency = company.currency.as_str();
    let template = ProformaTemplate {
        title: format!("Proforma {}", proforma.number),
        company: CompanyHeader::new(company),
        auto_print: company.auto_print,
        number: proforma.number.clone(),
        date: format_date(proforma.issue_date),
        valid_until: proforma.valid_until.map(format_date),
        client: client_label(proforma.client_name.as_deref()),
        lines: proforma
            .items
            .iter()
            .map(|item| DocLine::new(&item.product_name, item, currency))
            .collect(),
        total: format_amount(proforma.total_amount, currency),
    };

    Ok(PrintedDocument {
        name: format!("proforma-{}", proforma.number),
        html: template.render()?,
    })
}

/// Narrow ticket for the cashier printer.
pub fn render_receipt_80mm(
    invoice: &Invoice,
    change_due: i64,
    company: &CompanySettings,
) -> Result<PrintedDocument> {
    let currency = company.currency.as_str();
    let methods = payments::breakdown(&invoice.payments);
    let template = ReceiptTemplate {
        title: format!("Ticket {}", invoice.number),
        company: CompanyHeader::new(company),
        auto_print: company.auto_print,
        number: invoice.number.clone(),
        date: format_date(invoice.issue_date),
        client: client_label(invoice.client_name.as_deref()),
        lines: invoice
            .items
            .iter()
            .map(|item| DocLine::new(&item.product_name, item, currency))
            .collect(),
        total: format_amount(invoice.total_amount, currency),
        payments: methods
            .iter()
            .map(|m| PaymentLine {
                label: m.label.clone(),
                date: format_date(invoice.issue_date),
                amount: format_amount(m.amount, currency),
            })
            .collect(),
        change_due: (change_due > 0).then(|| format_amount(change_due, currency)),
        balance: (invoice.balance > 0).then(|| format_amount(invoice.balance, currency)),
    };

    Ok(PrintedDocument {
        name: format!("ticket-{}", invoice.number),
        html: template.render()?,
    })
}
