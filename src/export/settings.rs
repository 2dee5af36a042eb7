//! Settings backup file: `{metadata, settings: [{key, value}]}`.

use crate::db::{Database, SCHEMA_VERSION, Store, Table};
use crate::errors::{AppError, AppResult};
use crate::models::Setting;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub export_date: DateTime<Utc>,
    pub app_version: String,
    pub schema_version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsExport {
    pub metadata: ExportMetadata,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsImportReport {
    pub imported: usize,
    pub skipped: usize,
}

pub struct SettingsTransfer;

impl SettingsTransfer {
    pub fn snapshot(db: &Database) -> AppResult<SettingsExport> {
        Ok(SettingsExport {
            metadata: ExportMetadata {
                export_date: Utc::now(),
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                schema_version: SCHEMA_VERSION,
            },
            settings: db.repo::<Setting>().list()?,
        })
    }

    pub fn export_string(db: &Database) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&Self::snapshot(db)?)?)
    }

    pub fn export_file(db: &Database, path: &Path) -> AppResult<usize> {
        let snapshot = Self::snapshot(db)?;
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(snapshot.settings.len())
    }

    /// Upsert every setting of an exported document.
    ///
    /// The whole file is validated before anything is written: it must be a
    /// JSON object with a `settings` array, and its `metadata.schemaVersion`
    /// must not be newer than [`SCHEMA_VERSION`]. Rows without a string `key`
    /// are skipped.
    pub fn import_str(db: &Database, text: &str) -> AppResult<SettingsImportReport> {
        let doc: Value = serde_json::from_str(text)?;

        if let Some(found) = doc
            .pointer("/metadata/schemaVersion")
            .and_then(Value::as_i64)
            && found > SCHEMA_VERSION
        {
            return Err(AppError::IncompatibleSchema {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        let rows = doc
            .get("settings")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Import("missing 'settings' array".into()))?;

        let mut report = SettingsImportReport::default();
        let mut valid = Vec::with_capacity(rows.len());
        for row in rows {
            match row.get("key").and_then(Value::as_str) {
                Some(key) if !key.is_empty() => valid.push(Setting::new(
                    key,
                    row.get("value").cloned().unwrap_or(Value::Null),
                )),
                _ => {
                    debug!(target: "daytrack::db", row = %row, "settings row without key skipped");
                    report.skipped += 1;
                }
            }
        }

        db.transaction(&[Table::Settings], |tx| {
            let repo = tx.repo::<Setting>();
            for setting in &valid {
                repo.put(setting)?;
            }
            Ok(())
        })?;
        report.imported = valid.len();

        info!(target: "daytrack::db", imported = report.imported, skipped = report.skipped, "settings imported");
        Ok(report)
    }

    pub fn import_file(db: &Database, path: &Path) -> AppResult<SettingsImportReport> {
        let text = fs::read_to_string(path)?;
        Self::import_str(db, &text)
    }
}
