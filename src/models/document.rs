use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::LineItem;
use crate::render;
use crate::types::{DocumentKind, Party};

/// Header data plus the ordered item list of an invoice or quote.
///
/// The document does not know whether it is an invoice or a quote; the caller picks a
/// [`DocumentKind`] when it saves or renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    number: String,
    date: NaiveDate,
    seller: Party,
    seller_tax_id: String,
    buyer: Party,
    buyer_tax_id: String,
    items: Vec<LineItem>,
}

impl Document {
    pub fn new(
        number: impl Into<String>,
        date: NaiveDate,
        seller: Party,
        seller_tax_id: impl Into<String>,
        buyer: Party,
        buyer_tax_id: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            date,
            seller,
            seller_tax_id: seller_tax_id.into(),
            buyer,
            buyer_tax_id: buyer_tax_id.into(),
            items: Vec::new(),
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn seller(&self) -> &Party {
        &self.seller
    }

    pub fn seller_tax_id(&self) -> &str {
        &self.seller_tax_id
    }

    pub fn buyer(&self) -> &Party {
        &self.buyer
    }

    /// Only printed on invoices.
    pub fn buyer_tax_id(&self) -> &str {
        &self.buyer_tax_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Appends an item. Order is kept and numbered in the rendered output.
    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub fn total_net(&self) -> f64 {
        self.sum(LineItem::net_amount)
    }

    pub fn total_tax(&self) -> f64 {
        self.sum(LineItem::tax_amount)
    }

    pub fn total_gross(&self) -> f64 {
        self.total_net() + self.total_tax()
    }

    // Starts from +0.0 so an empty document prints "0.00", not "-0.00".
    fn sum(&self, amount: fn(&LineItem) -> f64) -> f64 {
        self.items.iter().map(amount).fold(0.0, |acc, v| acc + v)
    }

    pub fn render_invoice_text(&self) -> String {
        render::render_text(self, DocumentKind::Invoice)
    }

    pub fn render_quote_text(&self) -> String {
        render::render_text(self, DocumentKind::Quote)
    }

    pub fn render(&self, kind: DocumentKind) -> String {
        render::render_text(self, kind)
    }
}
