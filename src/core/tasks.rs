use crate::db::{Database, Store, Table};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Subtask, SubtaskEntry, SubtaskTemplate, Task, TaskCollection, TaskEntry, TaskStatus,
    TaskTemplate, TaskType,
};
use crate::utils::id::new_id;
use chrono::Utc;
use serde_json::{Value, json};

/// Usage figures derived from the task entry log.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStats {
    pub entries: usize,
    pub total_completion: f64,
    pub last_date: Option<chrono::NaiveDate>,
}

pub struct TaskLogic;

impl TaskLogic {
    pub fn create(
        db: &Database,
        name: &str,
        task_type: TaskType,
        preferred_segment: Option<String>,
        category: Option<String>,
    ) -> AppResult<Task> {
        if name.trim().is_empty() {
            return Err(AppError::Invalid("task name cannot be empty".into()));
        }
        let mut task = Task::new(new_id("task"), name.trim(), task_type);
        task.preferred_segment = preferred_segment;
        task.category = category;
        db.repo::<Task>().add(&task)?;
        Ok(task)
    }

    pub fn find(db: &Database, id_or_name: &str) -> AppResult<Task> {
        let repo = db.repo::<Task>();
        if let Some(t) = repo.get(id_or_name)? {
            return Ok(t);
        }
        repo.list()?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(id_or_name))
            .ok_or_else(|| AppError::NotFound {
                table: "tasks",
                id: id_or_name.to_string(),
            })
    }

    /// Active (non archived) tasks, optionally filtered by status.
    pub fn list(db: &Database, status: Option<TaskStatus>, include_archived: bool) -> AppResult<Vec<Task>> {
        let tasks = match status {
            Some(s) => db.repo::<Task>().find_by("status", s.as_str())?,
            None => db.repo::<Task>().list()?,
        };
        Ok(tasks
            .into_iter()
            .filter(|t| include_archived || !t.is_archived)
            .collect())
    }

    pub fn set_status(db: &Database, id: &str, status: TaskStatus) -> AppResult<()> {
        Self::patch(db, id, json!({ "status": status, "updatedAt": Utc::now() }))
    }

    /// Drag-and-drop target: move a task to another segment.
    pub fn move_to_segment(db: &Database, id: &str, segment_id: Option<&str>) -> AppResult<()> {
        Self::patch(
            db,
            id,
            json!({ "preferredSegment": segment_id, "updatedAt": Utc::now() }),
        )
    }

    pub fn archive(db: &Database, id: &str) -> AppResult<()> {
        Self::patch(db, id, json!({ "isArchived": true, "updatedAt": Utc::now() }))
    }

    fn patch(db: &Database, id: &str, patch: Value) -> AppResult<()> {
        if !db.repo::<Task>().update(id, &patch)? {
            return Err(AppError::NotFound {
                table: "tasks",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Tables touched by [`TaskLogic::delete`].
    pub const DELETE_SCOPE: [Table; 5] = [
        Table::Tasks,
        Table::Subtasks,
        Table::SubtaskEntries,
        Table::TaskEntries,
        Table::TaskCollections,
    ];

    /// Hard delete: the task, its subtasks, their logs and collection links.
    /// Inside a [`crate::db::Tx`] the deletion joins that transaction.
    pub fn delete(store: &impl Store, id: &str) -> AppResult<bool> {
        store.transaction(&Self::DELETE_SCOPE, |tx| {
            let key = json!(id);
            for s in tx.repo::<Subtask>().find_by("taskId", key.clone())? {
                tx.delete(Table::Subtasks, &s.id)?;
            }
            for e in tx.repo::<SubtaskEntry>().find_by("taskId", key.clone())? {
                tx.delete(Table::SubtaskEntries, &e.id)?;
            }
            for e in tx.repo::<TaskEntry>().find_by("taskId", key.clone())? {
                tx.delete(Table::TaskEntries, &e.id)?;
            }
            for l in tx.repo::<TaskCollection>().find_by("taskId", key)? {
                tx.delete(Table::TaskCollections, &l.id)?;
            }
            tx.delete(Table::Tasks, id)
        })
    }

    pub fn subtasks(db: &Database, task_id: &str) -> AppResult<Vec<Subtask>> {
        let mut subs = db.repo::<Subtask>().find_by("taskId", task_id)?;
        subs.sort_by_key(|s| s.order);
        Ok(subs)
    }

    pub fn add_subtask(db: &Database, task_id: &str, name: &str) -> AppResult<Subtask> {
        let order = Self::subtasks(db, task_id)?.len() as u32;
        let sub = Subtask {
            id: new_id("sub"),
            task_id: task_id.to_string(),
            name: name.to_string(),
            order,
            status: TaskStatus::Todo,
            created_at: Utc::now(),
        };
        db.repo::<Subtask>().add(&sub)?;
        Ok(sub)
    }

    /// Create a task (and its subtasks) from a template, bumping nothing on
    /// the template itself.
    pub fn from_template(db: &Database, template_name: &str) -> AppResult<Task> {
        let template = db
            .repo::<TaskTemplate>()
            .list()?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(template_name))
            .ok_or_else(|| AppError::NotFound {
                table: "task_templates",
                id: template_name.to_string(),
            })?;
        let mut children = db
            .repo::<SubtaskTemplate>()
            .find_by("templateId", template.id.as_str())?;
        children.sort_by_key(|c| c.order);

        let mut task = Task::new(new_id("task"), &template.name, template.task_type);
        task.category = template.category.clone();
        task.description = template.description.clone();
        task.preferred_segment = template.preferred_segment.clone();

        let subtasks: Vec<Subtask> = children
            .iter()
            .map(|c| Subtask {
                id: new_id("sub"),
                task_id: task.id.clone(),
                name: c.name.clone(),
                order: c.order,
                status: TaskStatus::Todo,
                created_at: task.created_at,
            })
            .collect();

        db.transaction(&[Table::Tasks, Table::Subtasks], |tx| {
            tx.repo::<Task>().add(&task)?;
            tx.repo::<Subtask>().bulk_add(&subtasks)?;
            Ok(())
        })?;
        Ok(task)
    }

    pub fn stats(db: &Database, task_id: &str) -> AppResult<TaskStats> {
        let entries = db.repo::<TaskEntry>().find_by("taskId", task_id)?;
        Ok(TaskStats {
            entries: entries.len(),
            total_completion: entries.iter().map(|e| e.completion_value).sum(),
            last_date: entries.iter().map(|e| e.date).max(),
        })
    }
}
