//! Fixed-width text layout shared by the invoice and quote variants.

use crate::models::Document;
use crate::types::DocumentKind;

const BANNER: &str = "=====================================";
const RULE: &str = "-------------------------------------";

pub const QUOTE_DISCLAIMER: &str = "Note: this is a quote, not a final invoice. It is non-binding.";

/// Renders the document as the text block that is previewed and printed.
///
/// Pure function of the document and the kind; the same input always yields the same bytes.
pub fn render_text(doc: &Document, kind: DocumentKind) -> String {
    let (number_label, date_label, buyer_label) = match kind {
        DocumentKind::Invoice => ("Invoice number:", "Invoice date:", "Buyer:"),
        DocumentKind::Quote => ("Quote number:", "Quote date:", "Customer:"),
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(BANNER.to_string());
    lines.push(centered(kind.title()));
    lines.push(BANNER.to_string());
    lines.push(format!("{:<16}{}", number_label, doc.number()));
    lines.push(format!("{:<16}{}", date_label, doc.date().format("%d-%m-%Y")));
    lines.push(RULE.to_string());

    lines.push("Seller:".to_string());
    lines.push(format!("  Name:    {}", doc.seller().name));
    lines.push(format!("  Address: {}", doc.seller().address));
    lines.push(format!("  Tax ID:  {}", doc.seller_tax_id()));
    lines.push(RULE.to_string());

    lines.push(buyer_label.to_string());
    lines.push(format!("  Name:    {}", doc.buyer().name));
    lines.push(format!("  Address: {}", doc.buyer().address));
    if kind == DocumentKind::Invoice {
        lines.push(format!("  Tax ID:  {}", doc.buyer_tax_id()));
    }
    lines.push(RULE.to_string());

    lines.push("Items:".to_string());
    lines.push(format!(
        "{:<5} {:<30} {:>8} {:>14} {:>10} {:>16} {:>10}",
        "Nr", "Description", "Qty", "UnitPrice", "Discount", "NetSubtotal", "Tax"
    ));
    for (index, item) in doc.items().iter().enumerate() {
        lines.push(format!(
            "{:<5} {:<30} {:>8} {:>14.2} {:>10.2} {:>16.2} {:>10.2}",
            index + 1,
            item.description(),
            decimal_text(item.quantity()),
            item.unit_price(),
            item.discount(),
            item.net_amount(),
            item.tax_amount()
        ));
    }
    lines.push(RULE.to_string());

    lines.push(format!("Total excl. tax:  {:>10.2}", doc.total_net()));
    lines.push(format!("Total tax:        {:>10.2}", doc.total_tax()));
    lines.push(format!("Total incl. tax:  {:>10.2}", doc.total_gross()));
    lines.push(BANNER.to_string());

    if kind == DocumentKind::Quote {
        lines.push(QUOTE_DISCLAIMER.to_string());
    }

    lines.join("\n")
}

/// Shortest text that reads back as the same number, always with a decimal point: `2.0`, `2.5`.
pub fn decimal_text(value: f64) -> String {
    format!("{:?}", value)
}

fn centered(title: &str) -> String {
    format!("{:^width$}", title, width = BANNER.len())
        .trim_end()
        .to_string()
}
