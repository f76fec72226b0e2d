pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod pdf;
pub mod render;
pub mod types;

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::AppState;
use config::Settings;

pub use crate::error::{Error, Result, ValidationError};
pub use models::{Document, LineItem};
pub use types::DocumentKind;

/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let state = match open_state(&cli) {
        Ok(state) => state,
        Err(e) => {
            error!("startup failed: {e}");
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli::execute(&state, cli.command) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn open_state(cli: &Cli) -> Result<AppState> {
    let settings = Settings::load(&cli.overrides())?;
    let db = db::Db::new(&settings.database_path)?;
    info!(db = %settings.database_path.display(), "store opened");
    Ok(AppState::new(db, settings))
}
