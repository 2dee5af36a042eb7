//! Read-only projections of tasks and their subtasks.

use crate::db::{Database, Store};
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::models::{Subtask, Task, TaskStatus};
use csv::Writer;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// `all`, or a single task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => *s == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        TaskStatus::parse(s)
            .map(StatusFilter::Only)
            .ok_or_else(|| AppError::Invalid(format!("unknown task status '{s}'")))
    }
}

#[derive(Debug, Serialize)]
struct TaskWithSubtasks<'a> {
    #[serde(flatten)]
    task: &'a Task,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    subtasks: Vec<&'a Subtask>,
}

pub struct TaskExportLogic;

impl TaskExportLogic {
    /// Non-archived tasks matching `filter`, each with its ordered subtasks.
    pub fn collect(db: &Database, filter: StatusFilter) -> AppResult<Vec<(Task, Vec<Subtask>)>> {
        let mut by_task: HashMap<String, Vec<Subtask>> = HashMap::new();
        for sub in db.repo::<Subtask>().list()? {
            by_task.entry(sub.task_id.clone()).or_default().push(sub);
        }

        Ok(db
            .repo::<Task>()
            .list()?
            .into_iter()
            .filter(|t| !t.is_archived && filter.matches(t.status))
            .map(|t| {
                let mut subs = by_task.remove(&t.id).unwrap_or_default();
                subs.sort_by_key(|s| s.order);
                (t, subs)
            })
            .collect())
    }

    pub fn render(db: &Database, format: ExportFormat, filter: StatusFilter) -> AppResult<String> {
        let rows = Self::collect(db, filter)?;
        match format {
            ExportFormat::Csv => render_csv(&rows),
            ExportFormat::Json => render_json(&rows),
            ExportFormat::Markdown => Ok(render_markdown(&rows)),
            ExportFormat::Text => Ok(render_text(&rows)),
        }
    }

    /// Write the rendering to `path`. Returns the number of tasks exported.
    pub fn export_file(
        db: &Database,
        format: ExportFormat,
        filter: StatusFilter,
        path: &Path,
    ) -> AppResult<usize> {
        let count = Self::collect(db, filter)?.len();
        fs::write(path, Self::render(db, format, filter)?)?;
        Ok(count)
    }
}

pub const CSV_HEADER: [&str; 6] = ["Name", "Type", "Status", "Category", "Segment", "Description"];
pub const SUBTASK_PREFIX: &str = "  - ";

fn render_csv(rows: &[(Task, Vec<Subtask>)]) -> AppResult<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for (task, subs) in rows {
        wtr.write_record([
            task.name.as_str(),
            task.task_type.as_str(),
            task.status.as_str(),
            task.category.as_deref().unwrap_or(""),
            task.preferred_segment.as_deref().unwrap_or(""),
            task.description.as_deref().unwrap_or(""),
        ])?;
        for sub in subs {
            wtr.write_record([
                format!("{SUBTASK_PREFIX}{}", sub.name).as_str(),
                "",
                sub.status.as_str(),
                "",
                "",
                "",
            ])?;
        }
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Other(format!("CSV buffer: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::Other(e.to_string()))
}

fn render_json(rows: &[(Task, Vec<Subtask>)]) -> AppResult<String> {
    let out: Vec<TaskWithSubtasks<'_>> = rows
        .iter()
        .map(|(task, subs)| TaskWithSubtasks {
            task,
            subtasks: subs.iter().collect(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&out)?)
}

fn checkbox(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "[x]",
        TaskStatus::Started => "[~]",
        TaskStatus::Todo => "[ ]",
    }
}

fn render_markdown(rows: &[(Task, Vec<Subtask>)]) -> String {
    let mut out = String::from("# Tasks\n\n");
    for (task, subs) in rows {
        let _ = write!(out, "- {} **{}**", checkbox(task.status), task.name);
        if let Some(cat) = &task.category {
            let _ = write!(out, " _({cat})_");
        }
        out.push('\n');
        if let Some(desc) = &task.description {
            let _ = writeln!(out, "  > {desc}");
        }
        for sub in subs {
            let _ = writeln!(out, "  - {} {}", checkbox(sub.status), sub.name);
        }
    }
    out
}

fn render_text(rows: &[(Task, Vec<Subtask>)]) -> String {
    let mut out = String::new();
    for (task, subs) in rows {
        let _ = writeln!(
            out,
            "{} [{}] ({})",
            task.name,
            task.status.as_str(),
            task.task_type.as_str()
        );
        for sub in subs {
            let _ = writeln!(out, "{SUBTASK_PREFIX}{} [{}]", sub.name, sub.status.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parses_all_and_statuses() {
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "completed".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(TaskStatus::Completed)
        );
        assert!("finished".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn csv_indents_subtasks() {
        let task = Task::new("t1".into(), "Buy milk", Default::default());
        let sub = Subtask {
            id: "s1".into(),
            task_id: "t1".into(),
            name: "pick 2%".into(),
            order: 0,
            status: TaskStatus::Todo,
            created_at: task.created_at,
        };
        let csv = render_csv(&[(task, vec![sub])]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Type,Status,Category,Segment,Description");
        assert!(lines[1].starts_with("Buy milk,standard,todo"));
        assert!(lines[2].starts_with("  - pick 2%,,todo"));
    }
}
