//! Safety copy of the database file taken before a schema upgrade.

use crate::errors::{AppError, AppResult};
use chrono::Local;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Write `<stamp>-backup_db_pre_v<from>.zip` next to the database file.
/// A missing file (nothing on disk yet) is not an error.
pub fn backup_before_upgrade(db_path: &Path, from: i64) -> AppResult<Option<PathBuf>> {
    if !db_path.exists() {
        warn!(target: "daytrack::db", path = %db_path.display(), "no database file, backup skipped");
        return Ok(None);
    }

    let backup_name = format!(
        "{}-backup_db_pre_v{from}.zip",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let backup_path = db_path
        .parent()
        .map(|p| p.join(&backup_name))
        .unwrap_or_else(|| PathBuf::from(&backup_name));

    let zip_err = |stage: &str, e: zip::result::ZipError| {
        AppError::Migration(format!("Backup failed ({stage}): {e}"))
    };

    let file = File::create(&backup_path)?;
    let mut zip = ZipWriter::new(file);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let entry_name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "database.sqlite".to_string());

    zip.start_file(entry_name, options)
        .map_err(|e| zip_err("start_file", e))?;
    zip.write_all(&fs::read(db_path)?)?;
    zip.finish().map_err(|e| zip_err("finish", e))?;

    info!(target: "daytrack::db", backup = %backup_path.display(), "pre-upgrade backup created");
    Ok(Some(backup_path))
}
