//! Unified application error type.
//! All modules (db, live, hooks, export, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Storage engine
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error(
        "Database is held by another process on an older version; close it and reload ({0})"
    )]
    VersionBlocked(String),

    #[error("Database schema version {found} is newer than this build supports ({supported})")]
    SchemaTooNew { found: i64, supported: i64 },

    #[error("Schema upgrade to version {version} failed: {reason}")]
    Upgrade { version: i64, reason: String },

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Table '{table}' has no index on '{field}'")]
    UnknownIndex { table: &'static str, field: String },

    #[error("Record '{id}' not found in '{table}'")]
    NotFound { table: &'static str, id: String },

    #[error("Record '{id}' already exists in '{table}'")]
    Duplicate { table: &'static str, id: String },

    // ---------------------------
    // Serialization
    // ---------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // ---------------------------
    // Validation
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid value: {0}")]
    Invalid(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Import / export
    // ---------------------------
    #[error("Export format not supported: {0}")]
    InvalidExportFormat(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("File was exported with schema version {found}, this build supports up to {supported}")]
    IncompatibleSchema { found: i64, supported: i64 },

    #[error("{what} export cancelled: '{path}' was left untouched")]
    ExportCancelled { what: &'static str, path: String },

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Errors that must stop the application from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::VersionBlocked(_) | AppError::SchemaTooNew { .. } | AppError::Upgrade { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
