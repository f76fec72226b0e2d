mod document;
mod line_item;

pub use document::Document;
pub use line_item::LineItem;

/// Rounds a currency amount to whole cents, half away from zero.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
