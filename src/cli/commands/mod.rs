pub mod checkin;
pub mod config;
pub mod db;
pub mod init;
pub mod seed;
pub mod segments;
pub mod settings;
pub mod task;
pub mod tasks;

use crate::config::Config;
use crate::core::startup::{Boot, boot};
use crate::errors::AppResult;
use crate::ui::messages::warning;

/// Open the configured database, run data migrations and seeding.
pub(crate) fn open(cfg: &Config) -> AppResult<Boot> {
    let booted = boot(&cfg.database)?;
    for (version, err) in &booted.migrations.failed {
        warning(format!("Migration v{version} failed: {err}"));
    }
    for (item, err) in &booted.seed.failed {
        warning(format!("Default '{item}' could not be created: {err}"));
    }
    Ok(booted)
}
