use serde::{Deserialize, Serialize};

/// One priced line of a document.
///
/// Fields are fixed at construction; the amounts are recomputed on every call so they always
/// follow the stored quantity, price, rate and discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    description: String,
    quantity: f64,
    unit_price: f64,
    tax_rate_percent: f64,
    discount: f64,
}

impl LineItem {
    /// Builds an item from already validated values. Use `forms::LineItemForm` to parse user input.
    pub fn new(
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        tax_rate_percent: f64,
        discount: f64,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            tax_rate_percent,
            discount,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    /// Percentage, e.g. `21.0` for 21%.
    pub fn tax_rate_percent(&self) -> f64 {
        self.tax_rate_percent
    }

    /// Absolute amount subtracted before tax.
    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// `quantity * unit_price - discount`
    pub fn net_amount(&self) -> f64 {
        self.quantity * self.unit_price - self.discount
    }

    /// `net_amount * tax_rate_percent / 100`
    pub fn tax_amount(&self) -> f64 {
        self.net_amount() * self.tax_rate_percent / 100.0
    }

    pub fn gross_amount(&self) -> f64 {
        self.net_amount() + self.tax_amount()
    }
}
