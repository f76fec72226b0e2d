//! Raw form input and its validation into domain values.
//!
//! Every field arrives as text, the way an entry widget or a draft file holds it. Nothing is
//! constructed until all fields of a form parse, so a rejected submission leaves no trace.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::{Document, LineItem};
use crate::types::{Customer, Material, Party};

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Accepts a JSON string, number or null for a text field.
fn form_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn required(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemForm {
    #[serde(default, deserialize_with = "form_field")]
    pub description: String,
    #[serde(default, deserialize_with = "form_field")]
    pub quantity: String,
    #[serde(default, deserialize_with = "form_field")]
    pub unit_price: String,
    #[serde(default, deserialize_with = "form_field")]
    pub tax_rate: String,
    /// Empty means no discount.
    #[serde(default, deserialize_with = "form_field")]
    pub discount: String,
}

impl LineItemForm {
    pub fn validate(&self) -> Result<LineItem, ValidationError> {
        let quantity = parse_number("quantity", &self.quantity)?;
        let unit_price = parse_number("unit price", &self.unit_price)?;
        let tax_rate = parse_number("tax rate", &self.tax_rate)?;
        let discount = if self.discount.trim().is_empty() {
            0.0
        } else {
            parse_number("discount", &self.discount)?
        };
        let description = required("description", &self.description)?;
        if quantity < 0.0 {
            return Err(ValidationError::NegativeQuantity(quantity));
        }
        Ok(LineItem::new(description, quantity, unit_price, tax_rate, discount))
    }

    /// Prefill from a stored material: description, price and a quantity of one.
    pub fn from_material(material: &Material) -> Self {
        Self {
            description: format!("{} - {}", material.name, material.description),
            quantity: "1".to_string(),
            unit_price: format!("{:.2}", material.unit_price),
            tax_rate: String::new(),
            discount: String::new(),
        }
    }
}

/// Header fields of the document being composed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderForm {
    #[serde(default, deserialize_with = "form_field")]
    pub number: String,
    /// `dd-mm-yyyy`
    #[serde(default, deserialize_with = "form_field")]
    pub date: String,
    #[serde(default)]
    pub seller: Party,
    #[serde(default, deserialize_with = "form_field")]
    pub seller_tax_id: String,
    #[serde(default)]
    pub buyer: Party,
    #[serde(default, deserialize_with = "form_field")]
    pub buyer_tax_id: String,
}

/// Draft file layout: the header plus line items still in form shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftFile {
    #[serde(flatten)]
    pub header: HeaderForm,
    #[serde(default)]
    pub items: Vec<LineItemForm>,
}

/// Form state while a document is being composed: header fields plus the validated item list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentDraft {
    pub header: HeaderForm,
    items: Vec<LineItem>,
}

impl DocumentDraft {
    pub fn new(header: HeaderForm) -> Self {
        Self {
            header,
            items: Vec::new(),
        }
    }

    /// Validates every item of a draft file in order; the first rejected item aborts the load.
    pub fn from_file(file: DraftFile) -> Result<Self, ValidationError> {
        let mut draft = Self::new(file.header);
        for form in &file.items {
            draft.add_item(form)?;
        }
        Ok(draft)
    }

    /// Validates and appends an item. A rejected item leaves the list unchanged.
    pub fn add_item(&mut self, form: &LineItemForm) -> Result<&LineItem, ValidationError> {
        let item = form.validate()?;
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Copies a stored customer into the buyer fields.
    pub fn select_customer(&mut self, customer: &Customer) {
        self.header.buyer = Party::new(customer.name.clone(), customer.address.clone());
    }

    /// Assembles the document from the current form state without consuming the draft.
    pub fn build(&self) -> Result<Document, ValidationError> {
        let date = NaiveDate::parse_from_str(self.header.date.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(self.header.date.clone()))?;
        let seller_tax_id = required("seller tax ID", &self.header.seller_tax_id)?;
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        let mut doc = Document::new(
            self.header.number.trim(),
            date,
            self.header.seller.clone(),
            seller_tax_id,
            self.header.buyer.clone(),
            self.header.buyer_tax_id.trim(),
        );
        for item in &self.items {
            doc.add_item(item.clone());
        }
        Ok(doc)
    }
}

/// Validated customer fields, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerForm {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl CustomerForm {
    pub fn validate(&self) -> Result<NewCustomer, ValidationError> {
        Ok(NewCustomer {
            name: required("customer name", &self.name)?,
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
        })
    }
}

/// Validated material fields, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMaterial {
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub stock: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "form_field")]
    pub unit_price: String,
    #[serde(default, deserialize_with = "form_field")]
    pub stock: String,
}

impl MaterialForm {
    pub fn validate(&self) -> Result<NewMaterial, ValidationError> {
        let unit_price = parse_number("unit price", &self.unit_price)?;
        let stock = self
            .stock
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidInteger {
                field: "stock",
                value: self.stock.clone(),
            })?;
        Ok(NewMaterial {
            name: required("material name", &self.name)?,
            description: self.description.trim().to_string(),
            unit_price,
            stock,
        })
    }
}
