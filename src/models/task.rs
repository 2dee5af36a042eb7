use crate::db::{Entity, Table};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    #[default]
    Standard,
    Tally,
    Subtasks,
    Stopwatch,
    Timer,
    Alarm,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Standard => "standard",
            TaskType::Tally => "tally",
            TaskType::Subtasks => "subtasks",
            TaskType::Stopwatch => "stopwatch",
            TaskType::Timer => "timer",
            TaskType::Alarm => "alarm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(TaskType::Standard),
            "tally" => Some(TaskType::Tally),
            "subtasks" => Some(TaskType::Subtasks),
            "stopwatch" => Some(TaskType::Stopwatch),
            "timer" => Some(TaskType::Timer),
            "alarm" => Some(TaskType::Alarm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Started,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Started => "started",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Some(TaskStatus::Todo),
            "started" | "in-progress" | "in_progress" => Some(TaskStatus::Started),
            "completed" | "done" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Task {
    const TABLE: Table = Table::Tasks;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Task {
    pub fn new(id: String, name: impl Into<String>, task_type: TaskType) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            task_type,
            status: TaskStatus::Todo,
            description: None,
            category: None,
            preferred_segment: None,
            target_count: None,
            duration_minutes: None,
            is_archived: false,
            usage_count: 0,
            last_used: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Completed,
    Partial,
    Skipped,
}

/// Append-only progress record for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub id: String,
    pub task_id: String,
    pub date: NaiveDate,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_name: Option<String>,
    pub status: EntryStatus,
    pub completion_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally_count: Option<u32>,
}

impl Entity for TaskEntry {
    const TABLE: Table = Table::TaskEntries;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for Subtask {
    const TABLE: Table = Table::Subtasks;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskEntry {
    pub id: String,
    pub subtask_id: String,
    pub task_id: String,
    pub date: NaiveDate,
    pub time: DateTime<Utc>,
    pub completed: bool,
}

impl Entity for SubtaskEntry {
    const TABLE: Table = Table::SubtaskEntries;

    fn id(&self) -> &str {
        &self.id
    }
}
