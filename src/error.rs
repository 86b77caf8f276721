//! Error type shared by the store, importer, backup and config layers.
//!
//! The aggregators in [`crate::analytics`] are infallible and never produce these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("import failed: {0}")]
    Import(String),

    #[error("invalid backup file: {0}")]
    InvalidBackup(String),

    #[error("no records to back up in the selected period")]
    NothingToBackup,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
