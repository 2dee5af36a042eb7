use crate::cli::parser::{Commands, TaskAction};
use crate::config::Config;
use crate::core::segments::SegmentLogic;
use crate::core::tasks::TaskLogic;
use crate::errors::{AppError, AppResult};
use crate::export::StatusFilter;
use crate::hooks::ToggleOutcome;
use crate::hooks::completion::toggle_task_completion;
use crate::models::{TaskStatus, TaskType};
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREEN, GREY, RESET, YELLOW};
use crate::utils::date::parse_date;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Task { action } = cmd else {
        return Ok(());
    };
    let booted = super::open(cfg)?;
    let db = &booted.db;

    match action {
        TaskAction::Add {
            name,
            task_type,
            segment,
            category,
            template,
        } => {
            let task = if let Some(template) = template {
                TaskLogic::from_template(db, template)?
            } else {
                let task_type = TaskType::parse(task_type)
                    .ok_or_else(|| AppError::Invalid(format!("unknown task type '{task_type}'")))?;
                let segment = match segment {
                    Some(s) => Some(SegmentLogic::find(db, s)?.id),
                    None => None,
                };
                TaskLogic::create(db, name, task_type, segment, category.clone())?
            };
            success(format!("Task '{}' created ({})", task.name, task.id));
        }
        TaskAction::Toggle { task, value, date } => {
            if !(*value > 0.0 && *value <= 1.0) {
                return Err(AppError::Invalid(format!(
                    "completion value must be in (0, 1], got {value}"
                )));
            }
            let task = TaskLogic::find(db, task)?;
            let date = parse_date(date)?;
            match toggle_task_completion(db, &task.id, date, *value)? {
                ToggleOutcome::Created(v) | ToggleOutcome::Updated(v) => {
                    success(format!("'{}' on {date}: {:.0}%", task.name, v * 100.0))
                }
                ToggleOutcome::Removed => info(format!("'{}' on {date}: cleared", task.name)),
            }
        }
        TaskAction::List { status, archived } => {
            let filter: StatusFilter = status.parse()?;
            let status = match filter {
                StatusFilter::All => None,
                StatusFilter::Only(s) => Some(s),
            };
            let tasks = TaskLogic::list(db, status, *archived)?;
            if tasks.is_empty() {
                info("No tasks.");
            }
            for t in tasks {
                let color = match t.status {
                    TaskStatus::Completed => GREEN,
                    TaskStatus::Started => YELLOW,
                    TaskStatus::Todo => RESET,
                };
                let archived = if t.is_archived {
                    format!(" {GREY}(archived){RESET}")
                } else {
                    String::new()
                };
                println!(
                    "{color}{:<10}{RESET} {:<32} {:<10} used {:>3}×{archived}",
                    t.status.as_str(),
                    t.name,
                    t.task_type.as_str(),
                    t.usage_count
                );
            }
        }
        TaskAction::Move { task, segment } => {
            let task = TaskLogic::find(db, task)?;
            let segment = match segment {
                Some(s) => Some(SegmentLogic::find(db, s)?),
                None => None,
            };
            TaskLogic::move_to_segment(db, &task.id, segment.as_ref().map(|s| s.id.as_str()))?;
            match segment {
                Some(s) => success(format!("Task '{}' moved to {}", task.name, s.name)),
                None => success(format!("Task '{}' has no preferred segment", task.name)),
            }
        }
        TaskAction::Archive { task } => {
            let task = TaskLogic::find(db, task)?;
            TaskLogic::archive(db, &task.id)?;
            success(format!("Task '{}' archived", task.name));
        }
        TaskAction::Delete { task } => {
            let task = TaskLogic::find(db, task)?;
            TaskLogic::delete(db, &task.id)?;
            success(format!("Task '{}' deleted", task.name));
        }
        TaskAction::Stats { task } => {
            let task = TaskLogic::find(db, task)?;
            let stats = TaskLogic::stats(db, &task.id)?;
            println!("📊 {}", task.name);
            println!("   entries     : {}", stats.entries);
            println!("   completion  : {:.2}", stats.total_completion);
            println!("   usage count : {}", task.usage_count);
            println!(
                "   last entry  : {}",
                stats
                    .last_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "--".into())
            );
        }
    }
    Ok(())
}
