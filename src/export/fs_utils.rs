//! Guarding export targets against accidental overwrites.

use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, warning};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Make sure the `what` export may write to `path`.
///
/// A missing file or `--force` passes straight through; otherwise the user
/// is asked on stdin and anything but yes cancels the export.
pub fn ensure_writable(path: &Path, force: bool, what: &'static str) -> AppResult<()> {
    if !path.exists() || force {
        return Ok(());
    }
    confirm_overwrite(path, what, &mut io::stdin().lock())
}

fn confirm_overwrite(path: &Path, what: &'static str, input: &mut impl BufRead) -> AppResult<()> {
    warning(format!("'{}' already exists.", path.display()));
    print!("Replace it with the {what} export? [y/N]: ");
    io::stdout().flush().ok();

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    if accepts(&answer) {
        info(format!("Overwriting '{}'.", path.display()));
        Ok(())
    } else {
        Err(AppError::ExportCancelled {
            what,
            path: path.display().to_string(),
        })
    }
}

fn accepts(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
