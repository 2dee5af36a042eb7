//! Task import from JSON or CSV.
//!
//! Import runs in two passes. Parsing validates the file as a whole (a CSV
//! without a `Name` column, or JSON that is not an array, is rejected before
//! anything is written). Applying then writes one task at a time; a failing
//! row is counted in [`ImportReport::errors`] and the import moves on.

use crate::core::tasks::TaskLogic;
use crate::db::{Database, Store};
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::tasks::SUBTASK_PREFIX;
use crate::models::{Subtask, Task, TaskStatus, TaskType};
use crate::utils::id::new_id;
use chrono::Utc;
use clap::ValueEnum;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// What to do with an imported task whose name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    #[default]
    Skip,
    /// Delete the existing task (with its subtasks and log) first.
    Replace,
    /// Import under a suffixed name: "Name (2)", "Name (3)", ...
    KeepBoth,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub policy: DuplicatePolicy,
    pub import_subtasks: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub tasks_imported: usize,
    pub subtasks_imported: usize,
    pub skipped: usize,
    /// One message per row that could not be imported.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingSubtask {
    #[serde(alias = "Name")]
    name: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingTask {
    #[serde(alias = "Name")]
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "type")]
    task_type: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, alias = "segment")]
    preferred_segment: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    subtasks: Vec<IncomingSubtask>,
}

#[derive(Debug)]
enum Row {
    Task(IncomingTask),
    Invalid(String),
    /// A subtask line with no importable parent.
    Orphan,
}

pub struct TaskImportLogic;

impl TaskImportLogic {
    pub fn import_file(db: &Database, path: &Path, options: ImportOptions) -> AppResult<ImportReport> {
        let format = ExportFormat::from_path(path)
            .ok_or_else(|| AppError::InvalidExportFormat(path.display().to_string()))?;
        let text = fs::read_to_string(path)?;
        Self::import_str(db, &text, format, options)
    }

    pub fn import_str(
        db: &Database,
        text: &str,
        format: ExportFormat,
        options: ImportOptions,
    ) -> AppResult<ImportReport> {
        let rows = match format {
            ExportFormat::Csv => parse_csv(text)?,
            ExportFormat::Json => parse_json(text)?,
            other => return Err(AppError::InvalidExportFormat(other.as_str().to_string())),
        };
        let report = apply(db, rows, options)?;
        info!(
            target: "daytrack::db",
            tasks = report.tasks_imported,
            subtasks = report.subtasks_imported,
            skipped = report.skipped,
            errors = report.errors.len(),
            "tasks imported"
        );
        Ok(report)
    }
}

fn blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// `"  - name"` marks a subtask of the previous task row.
fn subtask_name(raw: &str) -> Option<&str> {
    if let Some(rest) = raw.strip_prefix(SUBTASK_PREFIX) {
        return Some(rest.trim());
    }
    if raw.starts_with(char::is_whitespace) {
        return raw.trim_start().strip_prefix("- ").map(str::trim);
    }
    None
}

fn parse_csv(text: &str) -> AppResult<Vec<Row>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let name_col = column("Name")
        .ok_or_else(|| AppError::Import("CSV header must contain a 'Name' column".into()))?;
    let status_col = column("Status");
    let type_col = column("Type");
    let category_col = column("Category");
    let segment_col = column("Segment");
    let description_col = column("Description");

    let mut rows: Vec<Row> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let line = i + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                rows.push(Row::Invalid(format!("line {line}: {e}")));
                continue;
            }
        };
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).and_then(blank);
        let raw_name = record.get(name_col).unwrap_or("");

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if let Some(sub) = subtask_name(raw_name) {
            let sub = IncomingSubtask {
                name: sub.to_string(),
                status: field(status_col),
            };
            match rows.last_mut() {
                Some(Row::Task(parent)) => parent.subtasks.push(sub),
                _ => rows.push(Row::Orphan),
            }
            continue;
        }

        match blank(raw_name) {
            Some(name) => rows.push(Row::Task(IncomingTask {
                name,
                status: field(status_col),
                task_type: field(type_col),
                category: field(category_col),
                preferred_segment: field(segment_col),
                description: field(description_col),
                subtasks: Vec::new(),
            })),
            None => rows.push(Row::Invalid(format!("line {line}: empty task name"))),
        }
    }
    Ok(rows)
}

fn parse_json(text: &str) -> AppResult<Vec<Row>> {
    let doc: Value = serde_json::from_str(text)?;
    let Value::Array(items) = doc else {
        return Err(AppError::Import("JSON import must be an array of tasks".into()));
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match serde_json::from_value::<IncomingTask>(item) {
            Ok(t) if !t.name.trim().is_empty() => Row::Task(t),
            Ok(_) => Row::Invalid(format!("item {i}: empty task name")),
            Err(e) => Row::Invalid(format!("item {i}: {e}")),
        })
        .collect())
}

fn parse_status(s: Option<&str>) -> AppResult<TaskStatus> {
    match s {
        None => Ok(TaskStatus::Todo),
        Some(s) => TaskStatus::parse(s)
            .ok_or_else(|| AppError::Invalid(format!("unknown task status '{s}'"))),
    }
}

fn parse_type(s: Option<&str>) -> AppResult<TaskType> {
    match s {
        None => Ok(TaskType::Standard),
        Some(s) => TaskType::parse(s)
            .ok_or_else(|| AppError::Invalid(format!("unknown task type '{s}'"))),
    }
}

fn unique_name(base: &str, taken: &HashMap<String, String>) -> String {
    (2..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !taken.contains_key(&candidate.to_lowercase()))
        .unwrap_or_else(|| base.to_string())
}

fn build_task(incoming: &IncomingTask, name: String) -> AppResult<Task> {
    let mut task = Task::new(new_id("task"), name, parse_type(incoming.task_type.as_deref())?);
    task.status = parse_status(incoming.status.as_deref())?;
    task.category = incoming.category.clone();
    task.preferred_segment = incoming.preferred_segment.clone();
    task.description = incoming.description.clone();
    Ok(task)
}

fn build_subtasks(task: &Task, incoming: &[IncomingSubtask]) -> Vec<Subtask> {
    let now = Utc::now();
    incoming
        .iter()
        .enumerate()
        .map(|(i, s)| Subtask {
            id: new_id("sub"),
            task_id: task.id.clone(),
            name: s.name.clone(),
            order: i as u32,
            status: s
                .status
                .as_deref()
                .and_then(TaskStatus::parse)
                .unwrap_or_default(),
            created_at: now,
        })
        .collect()
}

fn apply(db: &Database, rows: Vec<Row>, options: ImportOptions) -> AppResult<ImportReport> {
    let mut report = ImportReport::default();

    // lowercase name -> id
    let mut names: HashMap<String, String> = db
        .repo::<Task>()
        .list()?
        .into_iter()
        .map(|t| (t.name.to_lowercase(), t.id))
        .collect();

    for row in rows {
        let incoming = match row {
            Row::Task(t) => t,
            Row::Invalid(msg) => {
                warn!(target: "daytrack::db", %msg, "import row rejected");
                report.errors.push(msg);
                continue;
            }
            Row::Orphan => {
                report.skipped += 1;
                continue;
            }
        };

        let sub_count = incoming.subtasks.len();
        let existing = names.get(&incoming.name.to_lowercase()).cloned();
        let (name, replace) = match (&existing, options.policy) {
            (None, _) => (incoming.name.clone(), None),
            (Some(_), DuplicatePolicy::Skip) => {
                report.skipped += 1 + sub_count;
                continue;
            }
            (Some(id), DuplicatePolicy::Replace) => (incoming.name.clone(), Some(id.clone())),
            (Some(_), DuplicatePolicy::KeepBoth) => (unique_name(&incoming.name, &names), None),
        };

        let result = build_task(&incoming, name).and_then(|task| {
            let subtasks = if options.import_subtasks {
                build_subtasks(&task, &incoming.subtasks)
            } else {
                Vec::new()
            };
            db.transaction(&TaskLogic::DELETE_SCOPE, |tx| {
                if let Some(old) = &replace {
                    TaskLogic::delete(tx, old)?;
                }
                tx.repo::<Task>().add(&task)?;
                tx.repo::<Subtask>().bulk_add(&subtasks)?;
                Ok(())
            })?;
            Ok((task, subtasks.len()))
        });

        match result {
            Ok((task, added)) => {
                report.tasks_imported += 1;
                report.subtasks_imported += added;
                report.skipped += sub_count - added;
                names.insert(task.name.to_lowercase(), task.id);
            }
            Err(e) => {
                warn!(target: "daytrack::db", task = %incoming.name, error = %e, "import row failed");
                report.errors.push(format!("{}: {e}", incoming.name));
            }
        }
    }

    Ok(report)
}
