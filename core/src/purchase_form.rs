//! Editable state of the purchase screen.
//!
//! The form is only a buffer: nothing reaches the database until
//! [`PurchaseForm::into_purchase`] succeeds and the caller saves the result.

use crate::error::{Error, Result};
use crate::models::{NewPayment, NewPurchase, Product, Purchase, PurchaseItem};
use crate::payments::PaymentMethodKind;
use crate::totals::{self, PurchaseTotals, MAX_AMOUNT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    ProductId,
    ProductName,
    Quantity,
    UnitPrice,
    SellPrice,
    Depot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentField {
    Method,
    Amount,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseForm {
    /// Set when the form was loaded from a saved purchase.
    pub editing_id: Option<i64>,
    pub reference: String,
    pub purchase_date: NaiveDate,
    pub supplier_id: Option<i64>,
    pub supplier_name: String,
    pub items: Vec<PurchaseItem>,
    pub payment_methods: Vec<NewPayment>,
    pub notes: Option<String>,
}

impl PurchaseForm {
    /// A fresh form with one blank line.
    pub fn new(purchase_date: NaiveDate) -> Self {
        PurchaseForm {
            editing_id: None,
            reference: String::new(),
            purchase_date,
            supplier_id: None,
            supplier_name: String::new(),
            items: vec![PurchaseItem::default()],
            payment_methods: Vec::new(),
            notes: None,
        }
    }

    pub fn from_purchase(purchase: &Purchase) -> Self {
        PurchaseForm {
            editing_id: Some(purchase.id),
            reference: purchase.reference.clone(),
            purchase_date: purchase.purchase_date,
            supplier_id: Some(purchase.supplier_id),
            supplier_name: purchase.supplier_name.clone(),
            items: purchase.items.clone(),
            payment_methods: purchase
                .payment_methods
                .iter()
                .map(|p| NewPayment {
                    method: p.method,
                    amount: p.amount,
                    date: p.date,
                })
                .collect(),
            notes: purchase.notes.clone(),
        }
    }

    pub fn set_supplier(&mut self, supplier_id: i64, supplier_name: impl Into<String>) {
        self.supplier_id = Some(supplier_id);
        self.supplier_name = supplier_name.into();
    }

    /// Appends a blank row and returns its index.
    pub fn add_item(&mut self) -> usize {
        self.items.push(PurchaseItem::default());
        self.items.len() - 1
    }

    /// Appends a row already filled by `fill`, in one step.
    pub fn add_item_with(&mut self, fill: impl FnOnce(&mut PurchaseItem)) -> usize {
        let mut item = PurchaseItem::default();
        fill(&mut item);
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Result<PurchaseItem> {
        if index >= self.items.len() {
            return Err(Error::validation(format!("Ligne {} inexistante", index + 1)));
        }
        Ok(self.items.remove(index))
    }

    pub fn update_item(&mut self, index: usize, field: ItemField, value: FieldValue) -> Result<()> {
        let line = index + 1;
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::validation(format!("Ligne {line} inexistante")))?;

        match (field, value) {
            (ItemField::ProductId, FieldValue::Number(n)) => item.product_id = n,
            (ItemField::Quantity, FieldValue::Number(n)) => {
                totals::check_quantity(line, n)?;
                item.quantity = n;
            }
            (ItemField::UnitPrice, FieldValue::Number(n)) => {
                totals::check_price(line, "le prix unitaire", n)?;
                item.unit_price = n;
            }
            (ItemField::SellPrice, FieldValue::Number(n)) => {
                totals::check_price(line, "le prix de vente", n)?;
                item.sell_price = n;
            }
            (ItemField::ProductName, FieldValue::Text(s)) => item.product_name = s,
            (ItemField::Depot, FieldValue::Text(s)) => item.depot = s,
            (field, _) => {
                return Err(Error::validation(format!(
                    "Ligne {line} : valeur invalide pour {field:?}"
                )))
            }
        }
        Ok(())
    }

    /// Fills a row from the catalog: name and both prices.
    pub fn select_product(&mut self, index: usize, product: &Product) -> Result<()> {
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::validation(format!("Ligne {} inexistante", index + 1)))?;
        item.product_id = product.id;
        item.product_name = product.name.clone();
        item.unit_price = product.purchase_price;
        item.sell_price = product.sell_price;
        Ok(())
    }

    pub fn add_payment(&mut self, method: PaymentMethodKind, amount: i64, date: NaiveDate) -> usize {
        self.payment_methods.push(NewPayment {
            method,
            amount,
            date,
        });
        self.payment_methods.len() - 1
    }

    pub fn remove_payment(&mut self, index: usize) -> Result<NewPayment> {
        if index >= self.payment_methods.len() {
            return Err(Error::validation(format!("Paiement {} inexistant", index + 1)));
        }
        Ok(self.payment_methods.remove(index))
    }

    pub fn update_payment(&mut self, index: usize, field: PaymentField, value: FieldValue) -> Result<()> {
        let line = index + 1;
        let payment = self
            .payment_methods
            .get_mut(index)
            .ok_or_else(|| Error::validation(format!("Paiement {line} inexistant")))?;

        match (field, value) {
            (PaymentField::Amount, FieldValue::Number(n)) => {
                if n > MAX_AMOUNT {
                    return Err(Error::validation(format!(
                        "Paiement {line} : le montant ne peut pas dépasser {MAX_AMOUNT} FCFA"
                    )));
                }
                payment.amount = n;
            }
            (PaymentField::Method, FieldValue::Text(s)) => payment.method = s.parse()?,
            (PaymentField::Date, FieldValue::Text(s)) => {
                payment.date = NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| Error::validation(format!("Paiement {line} : date invalide")))?;
            }
            (field, _) => {
                return Err(Error::validation(format!(
                    "Paiement {line} : valeur invalide pour {field:?}"
                )))
            }
        }
        Ok(())
    }

    pub fn totals(&self) -> PurchaseTotals {
        PurchaseTotals::compute(&self.items, &self.payment_methods)
    }

    pub fn validate(&self) -> Result<()> {
        check_new_purchase(&self.to_new_purchase())
    }

    /// Validates the form and turns it into a purchase ready to be saved.
    pub fn into_purchase(self) -> Result<NewPurchase> {
        let purchase = self.to_new_purchase();
        check_new_purchase(&purchase)?;
        Ok(purchase)
    }

    fn to_new_purchase(&self) -> NewPurchase {
        NewPurchase {
            reference: self.reference.trim().to_string(),
            purchase_date: self.purchase_date,
            // 0 is never a row id, so an unset supplier fails validation.
            supplier_id: self.supplier_id.unwrap_or_default(),
            items: self.items.clone(),
            payment_methods: self.payment_methods.clone(),
            notes: self.notes.clone(),
        }
    }
}

fn check_reference(reference: &str) -> Result<()> {
    if reference.trim().is_empty() {
        return Err(Error::validation("La référence est obligatoire"));
    }
    Ok(())
}

/// Submit-time rules shared by the form and the storage layer.
pub fn check_new_purchase(purchase: &NewPurchase) -> Result<()> {
    check_reference(&purchase.reference)?;

    if purchase.supplier_id <= 0 {
        return Err(Error::validation("Veuillez sélectionner un fournisseur"));
    }
    if purchase.items.is_empty() {
        return Err(Error::validation("Ajoutez au moins un article"));
    }

    for (index, item) in purchase.items.iter().enumerate() {
        let line = index + 1;
        if item.product_id <= 0 {
            return Err(Error::validation(format!("Ligne {line} : veuillez sélectionner un produit")));
        }
        if item.quantity <= 0 {
            return Err(Error::validation(format!(
                "Ligne {line} : la quantité doit être supérieure à 0"
            )));
        }
        if item.unit_price <= 0 {
            return Err(Error::validation(format!(
                "Ligne {line} : le prix unitaire doit être supérieur à 0"
            )));
        }
        totals::check_quantity(line, item.quantity)?;
        totals::check_price(line, "le prix unitaire", item.unit_price)?;
        totals::check_price(line, "le prix de vente", item.sell_price)?;
        if item.depot.trim().is_empty() {
            return Err(Error::validation(format!("Ligne {line} : veuillez choisir un dépôt")));
        }
    }

    for (index, payment) in purchase.payment_methods.iter().enumerate() {
        if payment.amount <= 0 {
            return Err(Error::validation(format!(
                "Paiement {} : le montant doit être supérieur à 0",
                index + 1
            )));
        }
        if payment.amount > MAX_AMOUNT {
            return Err(Error::validation(format!(
                "Paiement {} : le montant ne peut pas dépasser {MAX_AMOUNT} FCFA",
                index + 1
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totals::PaymentStatus;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn filled_form() -> PurchaseForm {
        let mut form = PurchaseForm::new(date());
        form.reference = "ACH-001".to_string();
        form.set_supplier(4, "CCBM");
        form.items.clear();
        form.add_item_with(|item| {
            item.product_id = 1;
            item.product_name = "Sucre 1kg".to_string();
            item.quantity = 2;
            item.unit_price = 1000;
            item.sell_price = 1200;
            item.depot = "Principal".to_string();
        });
        form.add_item_with(|item| {
            item.product_id = 2;
            item.product_name = "Huile 1L".to_string();
            item.quantity = 1;
            item.unit_price = 500;
            item.sell_price = 650;
            item.depot = "Annexe".to_string();
        });
        form
    }

    #[test]
    fn test_new_form_has_one_blank_line() {
        let form = PurchaseForm::new(date());
        assert_eq!(form.items.len(), 1);
        assert_eq!(form.items[0], PurchaseItem::default());
        assert_eq!(form.totals().document.total_amount, 0);
    }

    #[test]
    fn test_update_item_patches_only_that_field() {
        let mut form = filled_form();
        form.update_item(0, ItemField::Quantity, FieldValue::Number(5)).unwrap();

        assert_eq!(form.items[0].quantity, 5);
        assert_eq!(form.items[0].unit_price, 1000);
        assert_eq!(form.items[1].quantity, 1);
        assert_eq!(form.totals().document.total_amount, 5500);
    }

    #[test]
    fn test_update_item_rejects_out_of_range_amounts() {
        let mut form = filled_form();
        let err = form
            .update_item(0, ItemField::Quantity, FieldValue::Number(10_000_000_000))
            .unwrap_err();
        assert_eq!(err.to_string(), "Ligne 1 : la quantité ne peut pas dépasser 1000000");
        assert!(form
            .update_item(0, ItemField::UnitPrice, FieldValue::Number(10_000_000_000))
            .is_err());
        assert!(form
            .update_item(0, ItemField::SellPrice, FieldValue::Number(i64::MAX))
            .is_err());
        assert_eq!(form.add_payment(PaymentMethodKind::Cash, 100, date()), 0);
        assert!(form
            .update_payment(0, PaymentField::Amount, FieldValue::Number(i64::MAX))
            .is_err());

        assert_eq!(form.items[0].quantity, 2);
        assert_eq!(form.totals().document.total_amount, 2500);
    }

    #[test]
    fn test_totals_of_unchecked_rows_saturate() {
        let mut form = filled_form();
        form.add_item_with(|item| {
            item.quantity = 10_000_000_000;
            item.unit_price = 10_000_000_000;
            item.sell_price = 10_000_000_000;
        });
        form.add_payment(PaymentMethodKind::Cash, i64::MAX, date());
        form.add_payment(PaymentMethodKind::Wave, i64::MAX, date());

        let totals = form.totals();
        assert_eq!(totals.document.total_amount, i64::MAX);
        assert_eq!(totals.document.total_paid, i64::MAX);
        assert_eq!(totals.document.balance, 0);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_update_item_rejects_text_for_number() {
        let mut form = filled_form();
        let result = form.update_item(0, ItemField::Quantity, FieldValue::Text("deux".into()));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(form.update_item(9, ItemField::Depot, FieldValue::Text("A".into())).is_err());
    }

    #[test]
    fn test_totals_follow_payments() {
        let mut form = filled_form();
        form.add_payment(PaymentMethodKind::Cash, 1000, date());
        let p = form.add_payment(PaymentMethodKind::Wave, 200, date());
        form.update_payment(p, PaymentField::Amount, FieldValue::Number(500)).unwrap();

        let totals = form.totals().document;
        assert_eq!(totals.total_amount, 2500);
        assert_eq!(totals.total_paid, 1500);
        assert_eq!(totals.balance, 1000);
        assert_eq!(totals.status, PaymentStatus::Unpaid);

        form.remove_payment(0).unwrap();
        form.update_payment(0, PaymentField::Amount, FieldValue::Number(2500)).unwrap();
        assert_eq!(form.totals().document.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_remove_and_re_add_restores_total() {
        let mut form = filled_form();
        let before = form.totals().document.total_amount;

        let removed = form.remove_item(1).unwrap();
        assert_eq!(form.totals().document.total_amount, 2000);

        form.add_item_with(|item| *item = removed.clone());
        assert_eq!(form.totals().document.total_amount, before);
    }

    #[test]
    fn test_update_payment_method_by_name() {
        let mut form = filled_form();
        form.add_payment(PaymentMethodKind::Cash, 100, date());
        form.update_payment(0, PaymentField::Method, FieldValue::Text("orangeMoney".into()))
            .unwrap();
        assert_eq!(form.payment_methods[0].method, PaymentMethodKind::OrangeMoney);

        assert!(form
            .update_payment(0, PaymentField::Date, FieldValue::Text("03/06/2024".into()))
            .is_err());
    }

    #[test]
    fn test_validation_messages() {
        let mut form = filled_form();
        form.reference = "  ".to_string();
        assert_eq!(form.validate().unwrap_err().to_string(), "La référence est obligatoire");

        let mut form = filled_form();
        form.supplier_id = None;
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Veuillez sélectionner un fournisseur"
        );

        let mut form = filled_form();
        form.items[1].depot.clear();
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Ligne 2 : veuillez choisir un dépôt"
        );

        let mut form = filled_form();
        form.items[0].unit_price = 0;
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Ligne 1 : le prix unitaire doit être supérieur à 0"
        );

        let mut form = filled_form();
        form.items.clear();
        assert_eq!(form.validate().unwrap_err().to_string(), "Ajoutez au moins un article");
    }

    #[test]
    fn test_blank_line_blocks_submission() {
        let mut form = filled_form();
        form.add_item();
        let err = form.into_purchase().unwrap_err();
        assert_eq!(err.to_string(), "Ligne 3 : veuillez sélectionner un produit");
    }

    #[test]
    fn test_into_purchase_trims_reference() {
        let mut form = filled_form();
        form.reference = " ACH-002 ".to_string();
        let purchase = form.into_purchase().unwrap();
        assert_eq!(purchase.reference, "ACH-002");
        assert_eq!(purchase.supplier_id, 4);
        assert_eq!(purchase.items.len(), 2);
    }

    #[test]
    fn test_select_product_copies_catalog_prices() {
        let mut form = PurchaseForm::new(date());
        let product = Product {
            id: 12,
            name: "Lait en poudre".to_string(),
            reference: None,
            category_id: None,
            category_name: None,
            purchase_price: 2500,
            sell_price: 3000,
            low_stock_threshold: 5,
            created_at: String::new(),
        };
        form.select_product(0, &product).unwrap();

        assert_eq!(form.items[0].product_id, 12);
        assert_eq!(form.items[0].product_name, "Lait en poudre");
        assert_eq!(form.items[0].unit_price, 2500);
        assert_eq!(form.items[0].sell_price, 3000);
    }
}
