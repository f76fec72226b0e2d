use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::commands::{self, AppState};
use crate::config::Overrides;
use crate::forms::{CustomerForm, DocumentDraft, DraftFile, MaterialForm};
use crate::types::DocumentKind;

#[derive(Parser)]
#[command(
    name = "invoice-desk",
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[arg(long, global = true, help = "(Optional) Directory holding the store and generated PDFs.")]
    pub data_dir: Option<PathBuf>,

    #[arg(long = "db", global = true, help = "(Optional) SQLite database file.")]
    pub database_path: Option<PathBuf>,

    #[arg(long, global = true, help = "(Optional) Root folder for generated PDFs.")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            database_path: self.database_path.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args)]
pub struct DraftArgs {
    #[arg(long, help = "JSON draft with the header fields and line items.")]
    pub draft: PathBuf,

    #[arg(long, value_enum, default_value_t = DocumentKind::Invoice)]
    pub kind: DocumentKind,

    #[arg(long, help = "(Optional) Stored customer to use as buyer.")]
    pub customer: Option<i64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store the draft and write its PDF.
    Generate {
        #[command(flatten)]
        draft: DraftArgs,

        #[arg(long, help = "Open the PDF once written.")]
        open: bool,
    },
    /// Print the draft as rendered text without storing anything.
    Preview {
        #[command(flatten)]
        draft: DraftArgs,
    },
    AddCustomer {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    Customers,
    AddMaterial {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "price")]
        unit_price: String,
        #[arg(long, default_value = "0")]
        stock: String,
    },
    Materials,
    /// Print a line-item form prefilled from a stored material.
    SelectMaterial {
        #[arg(long)]
        id: i64,
    },
    /// Print a stored document.
    Show {
        #[arg(long)]
        id: i64,
    },
}

fn read_draft(path: &Path) -> Result<DocumentDraft, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    let file: DraftFile =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid draft {}: {}", path.display(), e))?;
    DocumentDraft::from_file(file).map_err(|e| {
        warn!(path = %path.display(), "draft rejected: {e}");
        e.to_string()
    })
}

fn load_draft(state: &AppState, args: &DraftArgs) -> Result<DocumentDraft, String> {
    let mut draft = read_draft(&args.draft)?;
    if let Some(id) = args.customer {
        commands::select_customer(state, id, &mut draft)?;
    }
    Ok(draft)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

/// Runs one command and returns what goes to stdout.
pub fn execute(state: &AppState, command: Command) -> Result<String, String> {
    match command {
        Command::Generate { draft, open } => {
            let doc = load_draft(state, &draft)?;
            let generated = commands::generate_document(state, &doc, draft.kind)?;
            if open {
                if let Err(e) = opener::open(&generated.pdf_path) {
                    warn!(path = %generated.pdf_path.display(), "could not open PDF: {e}");
                }
            }
            to_json(&generated)
        }
        Command::Preview { draft } => {
            let doc = load_draft(state, &draft)?;
            commands::preview_document(&doc, draft.kind)
        }
        Command::AddCustomer {
            name,
            address,
            phone,
            email,
        } => {
            let id = commands::save_customer(
                state,
                &CustomerForm {
                    name,
                    address,
                    phone,
                    email,
                },
            )?;
            Ok(format!("Customer saved with id {}", id))
        }
        Command::Customers => to_json(&commands::get_customers(state)?),
        Command::AddMaterial {
            name,
            description,
            unit_price,
            stock,
        } => {
            let id = commands::save_material(
                state,
                &MaterialForm {
                    name,
                    description,
                    unit_price,
                    stock,
                },
            )?;
            Ok(format!("Material saved with id {}", id))
        }
        Command::Materials => to_json(&commands::get_materials(state)?),
        Command::SelectMaterial { id } => to_json(&commands::select_material(state, id)?),
        Command::Show { id } => to_json(&commands::get_document(state, id)?),
    }
}
