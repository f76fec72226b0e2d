use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const APP_DIR_NAME: &str = "invoice-desk";
pub const DATA_DIR_VAR: &str = "INVOICE_DESK_DATA_DIR";
pub const DB_VAR: &str = "INVOICE_DESK_DB";
pub const OUTPUT_DIR_VAR: &str = "INVOICE_DESK_OUTPUT_DIR";

/// Where the store and the generated PDFs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Values given on the command line; each one wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// Everything lives under `data_dir`: `invoices.db` and the `pdf/` folder.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database_path: data_dir.join("invoices.db"),
            output_dir: data_dir.join("pdf"),
            data_dir,
        }
    }

    /// Resolves settings from overrides, then `.env` files and environment variables, then defaults.
    ///
    /// A `.env` in the working directory is read first, then one in the data directory, so
    /// users can keep their settings next to their data. Variables already set are never replaced.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let data_dir = match overrides.data_dir.clone().or_else(|| env_path(DATA_DIR_VAR)) {
            Some(dir) => dir,
            None => default_data_dir(),
        };
        load_env_file(&data_dir.join(".env"));

        let mut settings = Self::in_dir(data_dir);
        if let Some(db) = overrides.database_path.clone().or_else(|| env_path(DB_VAR)) {
            settings.database_path = db;
        }
        if let Some(out) = overrides.output_dir.clone().or_else(|| env_path(OUTPUT_DIR_VAR)) {
            settings.output_dir = out;
        }
        if settings.database_path.is_dir() {
            return Err(Error::Config(format!(
                "database path {} is a directory",
                settings.database_path.display()
            )));
        }
        debug!(?settings, "resolved settings");
        Ok(settings)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn load_env_file(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = dotenvy::from_path(path) {
        warn!(path = %path.display(), "could not read .env: {e}");
    }
}

fn default_data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR_NAME),
        None => {
            warn!("no user data directory, using the working directory");
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_dir_places_store_and_output_under_data_dir() {
        let settings = Settings::in_dir("/tmp/desk");
        assert_eq!(settings.database_path, PathBuf::from("/tmp/desk/invoices.db"));
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/desk/pdf"));
    }

    #[test]
    fn explicit_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(dir.path().to_path_buf()),
            database_path: Some(dir.path().join("other.db")),
            output_dir: Some(dir.path().join("print")),
        };
        let settings = Settings::load(&overrides).unwrap();
        assert_eq!(settings.data_dir, dir.path());
        assert_eq!(settings.database_path, dir.path().join("other.db"));
        assert_eq!(settings.output_dir, dir.path().join("print"));
    }

    #[test]
    fn directory_as_database_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            data_dir: Some(dir.path().to_path_buf()),
            database_path: Some(dir.path().to_path_buf()),
            output_dir: None,
        };
        assert!(matches!(Settings::load(&overrides), Err(Error::Config(_))));
    }
}
