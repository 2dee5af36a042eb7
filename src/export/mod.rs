// src/export/mod.rs

mod fs_utils;
pub mod import;
pub mod settings;
pub mod tasks;

pub use fs_utils::ensure_writable;
pub use import::{DuplicatePolicy, ImportOptions, ImportReport, TaskImportLogic};
pub use settings::{SettingsExport, SettingsImportReport, SettingsTransfer};
pub use tasks::{StatusFilter, TaskExportLogic};

use crate::ui::messages::success;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub(crate) fn notify_export_success(label: &str, path: &Path) {
    success(format!("{label} export completed: {}", path.display()));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Text => "text",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "txt" | "text" => Some(ExportFormat::Text),
            _ => None,
        }
    }
}
