//! Default rows inserted by the seeder. Ids are generated on every call.

use crate::models::{
    Category, Collection, Metric, Segment, SubtaskTemplate, Task, TaskTemplate, TaskType,
};
use crate::utils::id::new_id;
use serde_json::{Value, json};

/// Metrics that stay enabled no matter what the user toggled.
pub const CORE_METRICS: [&str; 5] = ["Mood", "Energy", "Focus", "Stress", "Motivation"];

pub const EXAMPLE_TASK_NAME: &str = "Drink a glass of water";
pub const EXAMPLE_COLLECTION: &str = "Morning Routine";

/// Six windows tiling the day from 06:00 round to 06:00.
pub fn segments() -> Vec<Segment> {
    [
        ("Early Morning", "06:00", "09:00", "#F6C177"),
        ("Morning", "09:00", "12:00", "#EBBCBA"),
        ("Afternoon", "12:00", "15:00", "#9CCFD8"),
        ("Late Afternoon", "15:00", "18:00", "#31748F"),
        ("Evening", "18:00", "22:00", "#C4A7E7"),
        ("Night", "22:00", "06:00", "#26233A"),
    ]
    .into_iter()
    .map(|(name, start, end, color)| Segment {
        id: new_id("seg"),
        name: name.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        color: color.to_string(),
    })
    .collect()
}

pub fn metrics() -> Vec<Metric> {
    let extras = ["Sleep Quality", "Anxiety"];
    CORE_METRICS
        .iter()
        .map(|n| (*n, true))
        .chain(extras.iter().map(|n| (*n, false)))
        .enumerate()
        .map(|(i, (name, enabled))| Metric {
            id: new_id("metric"),
            name: name.to_string(),
            enabled,
            min: 1,
            max: 10,
            order: i as u32,
        })
        .collect()
}

pub fn settings() -> Vec<(&'static str, Value)> {
    vec![
        ("theme", json!("system")),
        ("soundEnabled", json!(true)),
        ("soundVolume", json!(0.7)),
        ("backgroundImage", json!("")),
        ("useThemeBackgrounds", json!(false)),
        ("checkInReminders", json!(true)),
        ("weekStartsOn", json!("monday")),
        ("dateFormat", json!("YYYY-MM-DD")),
    ]
}

pub fn categories() -> Vec<Category> {
    [
        ("Work", "#3B82F6", "briefcase"),
        ("Health", "#10B981", "heart"),
        ("Personal", "#F59E0B", "user"),
        ("Learning", "#8B5CF6", "book"),
        ("Chores", "#6B7280", "home"),
    ]
    .into_iter()
    .map(|(name, color, icon)| Category {
        id: new_id("cat"),
        name: name.to_string(),
        color: color.to_string(),
        icon: Some(icon.to_string()),
    })
    .collect()
}

pub fn collections() -> Vec<Collection> {
    [
        (EXAMPLE_COLLECTION, "Start the day on purpose", "#F6C177"),
        ("Evening Wind-down", "Close the day calmly", "#C4A7E7"),
    ]
    .into_iter()
    .map(|(name, description, color)| Collection {
        id: new_id("col"),
        name: name.to_string(),
        description: description.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// Task templates with their subtask names.
pub fn task_templates() -> Vec<(TaskTemplate, Vec<&'static str>)> {
    let tpl = |name: &str, task_type, category: &str, segment: Option<&str>| TaskTemplate {
        id: new_id("tpl"),
        name: name.to_string(),
        task_type,
        category: Some(category.to_string()),
        description: None,
        preferred_segment: segment.map(str::to_string),
    };

    vec![
        (
            tpl("Morning Stretch", TaskType::Timer, "Health", Some("Early Morning")),
            vec![],
        ),
        (
            tpl("Weekly Review", TaskType::Subtasks, "Work", Some("Late Afternoon")),
            vec!["Clear inbox", "Review calendar", "Plan next week"],
        ),
        (
            tpl("Deep Work Block", TaskType::Stopwatch, "Work", Some("Morning")),
            vec![],
        ),
        (
            tpl("Read", TaskType::Standard, "Learning", Some("Evening")),
            vec![],
        ),
    ]
}

pub fn subtask_templates(template_id: &str, names: &[&str]) -> Vec<SubtaskTemplate> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| SubtaskTemplate {
            id: new_id("stpl"),
            template_id: template_id.to_string(),
            name: name.to_string(),
            order: i as u32,
        })
        .collect()
}

pub fn example_task() -> Task {
    let mut task = Task::new(new_id("task"), EXAMPLE_TASK_NAME, TaskType::Tally);
    task.category = Some("Health".to_string());
    task.target_count = Some(8);
    task
}
