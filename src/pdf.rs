//! Single-page PDF output of a rendered document.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::Document;
use crate::types::DocumentKind;

/// US Letter.
const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
/// 40pt from the left and top edges.
const MARGIN_MM: f32 = 14.11;
const FONT_SIZE_PT: f32 = 8.0;
const LINE_HEIGHT_PT: f32 = 10.0;
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Number of text lines that fit between the top and bottom margins.
pub fn page_capacity() -> usize {
    let usable_pt = (PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) * PT_PER_MM;
    (usable_pt / LINE_HEIGHT_PT).floor() as usize
}

static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();

fn unsafe_chars() -> Result<&'static Regex> {
    if let Some(re) = UNSAFE_CHARS.get() {
        return Ok(re);
    }
    let re = Regex::new(r"[^A-Za-z0-9._-]")?;
    Ok(UNSAFE_CHARS.get_or_init(|| re))
}

/// Fails with `PageOverflow` when `text` has more lines than one page holds.
pub fn ensure_fits(text: &str) -> Result<()> {
    let lines = text.lines().count();
    let capacity = page_capacity();
    if lines > capacity {
        return Err(Error::PageOverflow { lines, capacity });
    }
    Ok(())
}

/// Where the PDF for `number` goes: `<output_dir>/invoices/invoice_<number>.pdf` or
/// `<output_dir>/quotes/quote_<number>.pdf`.
pub fn output_path(output_dir: &Path, number: &str, kind: DocumentKind) -> Result<PathBuf> {
    let stem = unsafe_chars()?.replace_all(number.trim(), "_");
    let stem = if stem.is_empty() { "untitled".into() } else { stem };
    Ok(output_dir
        .join(kind.folder())
        .join(format!("{}_{}.pdf", kind.as_str(), stem)))
}

/// Lays the text out top-to-bottom in a fixed-width font on one page.
pub fn text_to_pdf_bytes(title: &str, text: &str) -> Result<Vec<u8>> {
    ensure_fits(text)?;

    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| Error::Pdf(e.to_string()))?;
    let layer = doc.get_page(page).get_layer(layer);

    layer.begin_text_section();
    layer.set_font(&font, FONT_SIZE_PT);
    layer.set_line_height(LINE_HEIGHT_PT);
    // The cursor is the baseline of the first line.
    let first_baseline = PAGE_HEIGHT_MM - MARGIN_MM - FONT_SIZE_PT / PT_PER_MM;
    layer.set_text_cursor(Mm(MARGIN_MM), Mm(first_baseline));
    for line in text.lines() {
        layer.write_text(line, &font);
        layer.add_line_break();
    }
    layer.end_text_section();

    doc.save_to_bytes().map_err(|e| Error::Pdf(e.to_string()))
}

/// Renders `doc` as `kind` and writes it to its mode-specific location, replacing any earlier file.
pub fn write_document_pdf(doc: &Document, kind: DocumentKind, output_dir: &Path) -> Result<PathBuf> {
    let path = output_path(output_dir, doc.number(), kind)?;
    let title = format!("{} {}", kind.title(), doc.number());
    let bytes = text_to_pdf_bytes(&title, &doc.render(kind))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;
    info!(path = %path.display(), kind = %kind, "wrote PDF");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use crate::types::Party;
    use chrono::NaiveDate;

    fn document_with_items(count: usize) -> Document {
        let mut doc = Document::new(
            "2025/0007",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Party::new("Acme BV", "Main Street 1"),
            "BE0123456789",
            Party::new("Jansen", "Church Lane 4"),
            "BE0987654321",
        );
        for i in 0..count {
            doc.add_item(LineItem::new(format!("Item {}", i + 1), 1.0, 10.0, 21.0, 0.0));
        }
        doc
    }

    #[test]
    fn output_paths_are_keyed_by_mode_and_number() {
        let root = Path::new("out");
        assert_eq!(
            output_path(root, "2025-0001", DocumentKind::Invoice).unwrap(),
            root.join("invoices").join("invoice_2025-0001.pdf")
        );
        assert_eq!(
            output_path(root, "2025/0001 b", DocumentKind::Quote).unwrap(),
            root.join("quotes").join("quote_2025_0001_b.pdf")
        );
        assert_eq!(
            output_path(root, "  ", DocumentKind::Quote).unwrap(),
            root.join("quotes").join("quote_untitled.pdf")
        );
    }

    #[test]
    fn writes_a_pdf_file_per_mode() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document_with_items(2);

        let invoice = write_document_pdf(&doc, DocumentKind::Invoice, dir.path()).unwrap();
        let quote = write_document_pdf(&doc, DocumentKind::Quote, dir.path()).unwrap();

        assert_eq!(invoice, dir.path().join("invoices").join("invoice_2025_0007.pdf"));
        assert_eq!(quote, dir.path().join("quotes").join("quote_2025_0007.pdf"));
        for path in [invoice, quote] {
            let bytes = fs::read(&path).unwrap();
            assert!(bytes.starts_with(b"%PDF-"));
        }
    }

    #[test]
    fn rewriting_replaces_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_document_pdf(&document_with_items(1), DocumentKind::Invoice, dir.path()).unwrap();
        let second = write_document_pdf(&document_with_items(3), DocumentKind::Invoice, dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(dir.path().join("invoices")).unwrap().count(), 1);
    }

    #[test]
    fn long_documents_do_not_fit() {
        let capacity = page_capacity();
        assert!(ensure_fits(&document_with_items(2).render_invoice_text()).is_ok());
        assert!(ensure_fits(&vec!["line"; capacity].join("\n")).is_ok());
        assert!(matches!(
            ensure_fits(&document_with_items(60).render_invoice_text()),
            Err(Error::PageOverflow { capacity: cap, .. }) if cap == capacity
        ));
    }

    #[test]
    fn text_longer_than_a_page_is_rejected() {
        let capacity = page_capacity();
        assert!(capacity > 40);
        let text = vec!["line"; capacity + 1].join("\n");
        match text_to_pdf_bytes("too long", &text) {
            Err(Error::PageOverflow { lines, capacity: cap }) => {
                assert_eq!(lines, capacity + 1);
                assert_eq!(cap, capacity);
            }
            other => panic!("expected PageOverflow, got {:?}", other.map(|b| b.len())),
        }
    }
}
