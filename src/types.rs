use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name and address of a seller or buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: String,
    pub address: String,
}

impl Party {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Which variant of a document is saved and rendered. Chosen by the caller, never stored on the document itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Invoice,
    Quote,
}

impl DocumentKind {
    /// Discriminator stored in `documents.document_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quote => "quote",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INVOICE",
            DocumentKind::Quote => "QUOTE",
        }
    }

    /// Sub-folder of the output directory that holds this kind of PDF.
    pub fn folder(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoices",
            DocumentKind::Quote => "quotes",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocumentKind::Invoice),
            "quote" => Ok(DocumentKind::Quote),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub stock: i64,
}

/// Header row of a saved document, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: i64,
    pub number: String,
    pub date: NaiveDate,
    pub seller: Party,
    pub seller_tax_id: String,
    pub buyer: Party,
    pub buyer_tax_id: String,
    pub total_net: f64,
    pub total_tax: f64,
    pub total_gross: f64,
    pub document_type: DocumentKind,
    pub items: Vec<StoredItem>,
}

/// Child row of a saved document. Amounts are the values computed when it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: i64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub discount: f64,
    pub net_amount: f64,
    pub tax_amount: f64,
    pub gross_amount: f64,
}
