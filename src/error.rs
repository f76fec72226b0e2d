use thiserror::Error;

/// Input rejected at the form boundary. Nothing is built or stored when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} must be a number (got {value:?})")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be a whole number (got {value:?})")]
    InvalidInteger { field: &'static str, value: String },

    #[error("quantity must not be negative (got {0})")]
    NegativeQuantity(f64),

    #[error("invalid date {0:?}, use the format dd-mm-yyyy")]
    InvalidDate(String),

    #[error("add at least one line item")]
    NoItems,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database connection is unavailable")]
    LockPoisoned,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("document needs {lines} lines but a page holds {capacity}")]
    PageOverflow { lines: usize, capacity: usize },

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
