//! Action boundary: each function is one user action and reports failures as a message.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::db::Db;
use crate::error::Error;
use crate::forms::{CustomerForm, DocumentDraft, LineItemForm, MaterialForm};
use crate::pdf;
use crate::render::decimal_text;
use crate::types::{Customer, DocumentKind, Material, StoredDocument};

pub struct AppState {
    pub db: Mutex<Option<Db>>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(db: Db, settings: Settings) -> Self {
        Self {
            db: Mutex::new(Some(db)),
            settings,
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&Db) -> Result<T, String>) -> Result<T, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        let db = db.as_ref().ok_or("Database not initialized")?;
        f(db)
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratedDocument {
    pub document_id: i64,
    pub pdf_path: PathBuf,
}

/// Text shown in the preview window.
pub fn preview_document(draft: &DocumentDraft, kind: DocumentKind) -> Result<String, String> {
    let doc = draft.build().map_err(|e| {
        warn!("preview rejected: {e}");
        e.to_string()
    })?;
    Ok(doc.render(kind))
}

/// Adds a line to the on-screen item list. Returns the line as shown in the list.
pub fn add_line_item(draft: &mut DocumentDraft, form: &LineItemForm) -> Result<String, String> {
    let item = draft.add_item(form).map_err(|e| {
        warn!("line item rejected: {e}");
        e.to_string()
    })?;
    Ok(format!(
        "{} | Qty: {} | Price: {} | Tax: {}% | Discount: {}",
        item.description(),
        decimal_text(item.quantity()),
        decimal_text(item.unit_price()),
        decimal_text(item.tax_rate_percent()),
        decimal_text(item.discount())
    ))
}

/// Builds the document, stores it, then writes its PDF.
///
/// A document too long for one page is rejected before anything is stored. A storage failure
/// stops before any file is written. A PDF failure is reported after the record has been
/// stored; the record stays.
pub fn generate_document(
    state: &AppState,
    draft: &DocumentDraft,
    kind: DocumentKind,
) -> Result<GeneratedDocument, String> {
    let doc = draft.build().map_err(|e| {
        warn!("document rejected: {e}");
        e.to_string()
    })?;
    pdf::ensure_fits(&doc.render(kind)).map_err(|e| {
        warn!(number = doc.number(), kind = %kind, "document rejected: {e}");
        e.to_string()
    })?;

    let document_id = state.with_db(|db| {
        db.save_document(&doc, kind).map_err(|e| {
            error!(number = doc.number(), kind = %kind, "saving document failed: {e}");
            format!("An error occurred while saving the {} to the database: {}", kind, e)
        })
    })?;

    let pdf_path = pdf::write_document_pdf(&doc, kind, &state.settings.output_dir).map_err(|e| {
        error!(document_id, kind = %kind, "writing PDF failed: {e}");
        format!(
            "The {} was saved (id {}) but its PDF could not be generated: {}",
            kind, document_id, e
        )
    })?;

    info!(document_id, pdf = %pdf_path.display(), "generated {}", kind);
    Ok(GeneratedDocument {
        document_id,
        pdf_path,
    })
}

pub fn get_document(state: &AppState, id: i64) -> Result<StoredDocument, String> {
    state.with_db(|db| {
        db.get_document(id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| Error::NotFound { what: "document", id }.to_string())
    })
}

pub fn save_customer(state: &AppState, form: &CustomerForm) -> Result<i64, String> {
    let customer = form.validate().map_err(|e| {
        warn!("customer rejected: {e}");
        e.to_string()
    })?;
    state.with_db(|db| {
        db.save_customer(&customer)
            .map_err(|e| format!("An error occurred while saving the customer: {}", e))
    })
}

pub fn get_customers(state: &AppState) -> Result<Vec<Customer>, String> {
    state.with_db(|db| db.get_customers().map_err(|e| e.to_string()))
}

/// Prefills the draft's buyer from a stored customer.
pub fn select_customer(state: &AppState, id: i64, draft: &mut DocumentDraft) -> Result<Customer, String> {
    let customer = state.with_db(|db| {
        db.get_customer(id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| Error::NotFound { what: "customer", id }.to_string())
    })?;
    draft.select_customer(&customer);
    Ok(customer)
}

pub fn save_material(state: &AppState, form: &MaterialForm) -> Result<i64, String> {
    let material = form.validate().map_err(|e| {
        warn!("material rejected: {e}");
        e.to_string()
    })?;
    state.with_db(|db| {
        db.save_material(&material)
            .map_err(|e| format!("An error occurred while saving the material: {}", e))
    })
}

pub fn get_materials(state: &AppState) -> Result<Vec<Material>, String> {
    state.with_db(|db| db.get_materials().map_err(|e| e.to_string()))
}

/// Line-item form prefilled from a stored material.
pub fn select_material(state: &AppState, id: i64) -> Result<LineItemForm, String> {
    let material = state.with_db(|db| {
        db.get_material(id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| Error::NotFound { what: "material", id }.to_string())
    })?;
    Ok(LineItemForm::from_material(&material))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::HeaderForm;
    use crate::types::Party;
    use std::fs;

    fn state_in(dir: &std::path::Path) -> AppState {
        let settings = Settings::in_dir(dir);
        let db = Db::new(&settings.database_path).unwrap();
        AppState::new(db, settings)
    }

    fn item(description: &str, quantity: &str, price: &str, rate: &str, discount: &str) -> LineItemForm {
        LineItemForm {
            description: description.to_string(),
            quantity: quantity.to_string(),
            unit_price: price.to_string(),
            tax_rate: rate.to_string(),
            discount: discount.to_string(),
        }
    }

    fn draft() -> DocumentDraft {
        let mut draft = DocumentDraft::new(HeaderForm {
            number: "2025-0001".to_string(),
            date: "14-03-2025".to_string(),
            seller: Party::new("Acme BV", "Main Street 1"),
            seller_tax_id: "BE0123456789".to_string(),
            buyer: Party::new("Jansen", "Church Lane 4"),
            buyer_tax_id: "BE0987654321".to_string(),
        });
        add_line_item(&mut draft, &item("Service", "1", "100", "21", "")).unwrap();
        add_line_item(&mut draft, &item("Parts", "2", "50", "21", "10")).unwrap();
        draft
    }

    #[test]
    fn add_line_item_describes_the_line() {
        let mut draft = DocumentDraft::default();
        let line = add_line_item(&mut draft, &item("Tiles", "3", "10", "0", "5")).unwrap();
        assert_eq!(line, "Tiles | Qty: 3.0 | Price: 10.0 | Tax: 0.0% | Discount: 5.0");
        let err = add_line_item(&mut draft, &item("", "3", "10", "0", "")).unwrap_err();
        assert_eq!(err, "description must not be empty");
        assert_eq!(draft.items().len(), 1);
    }

    #[test]
    fn generate_stores_record_and_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let generated = generate_document(&state, &draft(), DocumentKind::Invoice).unwrap();
        assert_eq!(
            generated.pdf_path,
            dir.path().join("pdf").join("invoices").join("invoice_2025-0001.pdf")
        );
        assert!(fs::read(&generated.pdf_path).unwrap().starts_with(b"%PDF-"));

        let stored = get_document(&state, generated.document_id).unwrap();
        assert_eq!(stored.document_type, DocumentKind::Invoice);
        assert_eq!(stored.total_gross, 229.9);
        assert_eq!(stored.items.len(), 2);
    }

    #[test]
    fn generate_quote_uses_quote_location() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let generated = generate_document(&state, &draft(), DocumentKind::Quote).unwrap();
        assert_eq!(
            generated.pdf_path,
            dir.path().join("pdf").join("quotes").join("quote_2025-0001.pdf")
        );
        assert_eq!(
            get_document(&state, generated.document_id).unwrap().document_type,
            DocumentKind::Quote
        );
    }

    #[test]
    fn invalid_draft_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let empty = DocumentDraft::new(draft().header);

        let err = generate_document(&state, &empty, DocumentKind::Invoice).unwrap_err();
        assert_eq!(err, "add at least one line item");
        assert!(get_document(&state, 1).is_err());
        assert!(!dir.path().join("pdf").exists());
    }

    #[test]
    fn too_long_for_one_page_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let mut long = draft();
        for i in 0..58 {
            add_line_item(&mut long, &item(&format!("Part {}", i), "1", "5", "21", "")).unwrap();
        }
        assert_eq!(long.items().len(), 60);

        let err = generate_document(&state, &long, DocumentKind::Invoice).unwrap_err();
        assert!(err.starts_with("document needs"), "{err}");
        assert!(get_document(&state, 1).is_err());
        assert!(!dir.path().join("pdf").exists());

        // Preview still shows the full text.
        assert!(preview_document(&long, DocumentKind::Invoice).is_ok());
    }

    #[test]
    fn storage_failure_skips_the_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        {
            let conn = rusqlite::Connection::open(&state.settings.database_path).unwrap();
            conn.execute_batch("DROP TABLE document_items;").unwrap();
        }

        let err = generate_document(&state, &draft(), DocumentKind::Invoice).unwrap_err();
        assert!(err.starts_with("An error occurred while saving the invoice"), "{err}");
        assert!(!dir.path().join("pdf").exists());
        // The header insert was rolled back with the failed item insert.
        let conn = rusqlite::Connection::open(&state.settings.database_path).unwrap();
        let headers: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))
            .unwrap();
        assert_eq!(headers, 0);
    }

    #[test]
    fn pdf_failure_keeps_the_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        // A plain file where the output folder should be makes the write fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        state.settings.output_dir = blocker;

        let err = generate_document(&state, &draft(), DocumentKind::Invoice).unwrap_err();
        assert!(err.starts_with("The invoice was saved (id 1)"), "{err}");
        let stored = get_document(&state, 1).unwrap();
        assert_eq!(stored.number, "2025-0001");
    }

    #[test]
    fn preview_matches_rendered_text() {
        let text = preview_document(&draft(), DocumentKind::Quote).unwrap();
        assert_eq!(text, draft().build().unwrap().render_quote_text());
    }

    #[test]
    fn customers_and_materials_prefill_the_draft() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());

        let customer_id = save_customer(
            &state,
            &CustomerForm {
                name: "Peeters".to_string(),
                address: "Market 9".to_string(),
                ..CustomerForm::default()
            },
        )
        .unwrap();
        assert!(save_customer(&state, &CustomerForm::default()).is_err());
        assert_eq!(get_customers(&state).unwrap().len(), 1);

        let mut draft = draft();
        select_customer(&state, customer_id, &mut draft).unwrap();
        assert_eq!(draft.header.buyer, Party::new("Peeters", "Market 9"));
        assert!(select_customer(&state, 99, &mut draft).is_err());

        let material_id = save_material(
            &state,
            &MaterialForm {
                name: "Tile".to_string(),
                description: "Ceramic".to_string(),
                unit_price: "2.5".to_string(),
                stock: "40".to_string(),
            },
        )
        .unwrap();
        assert_eq!(get_materials(&state).unwrap().len(), 1);

        let mut form = select_material(&state, material_id).unwrap();
        assert_eq!(form.description, "Tile - Ceramic");
        form.tax_rate = "21".to_string();
        add_line_item(&mut draft, &form).unwrap();
        assert_eq!(draft.items().len(), 3);
        assert_eq!(draft.items()[2].unit_price(), 2.5);
    }
}
