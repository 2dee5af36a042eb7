use crate::cli::parser::{Commands, TasksAction};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::export::{
    ExportFormat, ImportOptions, StatusFilter, TaskExportLogic, TaskImportLogic, ensure_writable,
    notify_export_success,
};
use crate::ui::messages::{success, warning};
use std::path::Path;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Tasks { action } = cmd else {
        return Ok(());
    };
    let booted = super::open(cfg)?;
    let db = &booted.db;

    match action {
        TasksAction::Export {
            file,
            format,
            status,
            force,
        } => {
            let path = Path::new(file);
            let format = (*format)
                .or_else(|| ExportFormat::from_path(path))
                .ok_or_else(|| AppError::InvalidExportFormat(file.clone()))?;
            let filter: StatusFilter = status.as_deref().unwrap_or(&cfg.export_status).parse()?;

            ensure_writable(path, *force, "Tasks")?;
            let n = TaskExportLogic::export_file(db, format, filter, path)?;
            if n == 0 {
                warning("⚠️  No tasks matched the selected status.");
            }
            notify_export_success(&format!("Tasks ({n}, {})", format.as_str()), path);
        }
        TasksAction::Import {
            file,
            policy,
            subtasks,
        } => {
            let options = ImportOptions {
                policy: (*policy).unwrap_or(cfg.import_policy),
                import_subtasks: *subtasks,
            };
            let report = TaskImportLogic::import_file(db, Path::new(file), options)?;
            for e in &report.errors {
                warning(e);
            }
            success(format!(
                "Import finished: {} tasks, {} subtasks, {} skipped, {} errors",
                report.tasks_imported,
                report.subtasks_imported,
                report.skipped,
                report.errors.len()
            ));
        }
    }
    Ok(())
}
