use crate::cli::parser::{Commands, SettingsAction};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::export::{SettingsTransfer, ensure_writable, notify_export_success};
use crate::hooks::SettingsHook;
use crate::hooks::settings::load_settings;
use crate::ui::messages::{info, success};
use serde_json::Value;
use std::path::Path;
use std::rc::Rc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Settings { action } = cmd else {
        return Ok(());
    };
    let booted = super::open(cfg)?;
    let db = Rc::new(booted.db);

    match action {
        SettingsAction::Get { key: Some(key) } => {
            let settings = load_settings(&db)?;
            let value = settings.get(key).ok_or_else(|| AppError::NotFound {
                table: "settings",
                id: key.clone(),
            })?;
            println!("{value}");
        }
        SettingsAction::Get { key: None } => {
            for (key, value) in load_settings(&db)? {
                println!("{key:<28} {value}");
            }
        }
        SettingsAction::Set { key, value } => {
            let value = serde_json::from_str::<Value>(value)
                .unwrap_or_else(|_| Value::String(value.clone()));
            let mut hook = SettingsHook::new(Rc::clone(&db));
            db.pump();
            if hook.set(key.as_str(), value.clone()) {
                hook.settle()?;
                success(format!("{key} = {value}"));
            } else {
                info(format!("{key} already is {value}"));
            }
        }
        SettingsAction::Export { file, force } => {
            let path = Path::new(file);
            ensure_writable(path, *force, "Settings")?;
            let n = SettingsTransfer::export_file(&db, path)?;
            notify_export_success(&format!("Settings ({n})"), path);
        }
        SettingsAction::Import { file } => {
            let report = SettingsTransfer::import_file(&db, Path::new(file))?;
            success(format!(
                "Settings imported: {} imported, {} skipped",
                report.imported, report.skipped
            ));
        }
    }
    Ok(())
}
