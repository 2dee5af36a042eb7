//! Task completion toggling for one day.
//!
//! Toggling is a three-way state machine, not an upsert: no entry creates
//! one, an entry at or above [`FULL_COMPLETION_THRESHOLD`] is removed, any
//! other entry grows by the given value, capped at 1.0.

use crate::db::{Database, Store, Table};
use crate::errors::AppResult;
use crate::hooks::Optimistic;
use crate::models::{EntryStatus, Task, TaskEntry};
use crate::utils::id::new_id;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::rc::Rc;

/// Accumulated float additions may stop short of exactly 1.0.
pub const FULL_COMPLETION_THRESHOLD: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToggleOutcome {
    Created(f64),
    Updated(f64),
    Removed,
}

pub fn decide(existing: Option<f64>, value: f64) -> ToggleOutcome {
    match existing {
        None => ToggleOutcome::Created(value.min(1.0)),
        Some(current) if current >= FULL_COMPLETION_THRESHOLD => ToggleOutcome::Removed,
        Some(current) => ToggleOutcome::Updated((current + value).min(1.0)),
    }
}

fn status_for(value: f64) -> EntryStatus {
    if value >= FULL_COMPLETION_THRESHOLD {
        EntryStatus::Completed
    } else {
        EntryStatus::Partial
    }
}

fn entry_for(store: &impl Store, task_id: &str, date: NaiveDate) -> AppResult<Option<TaskEntry>> {
    Ok(store
        .repo::<TaskEntry>()
        .find_by("taskId", task_id)?
        .into_iter()
        .find(|e| e.date == date))
}

/// Apply one toggle against storage, atomically.
pub fn toggle_task_completion(
    store: &impl Store,
    task_id: &str,
    date: NaiveDate,
    value: f64,
) -> AppResult<ToggleOutcome> {
    store.transaction(&[Table::TaskEntries, Table::Tasks], |tx| {
        let existing = entry_for(tx, task_id, date)?;
        let outcome = decide(existing.as_ref().map(|e| e.completion_value), value);

        match (outcome, existing) {
            (ToggleOutcome::Created(v), _) => {
                let now = Utc::now();
                tx.repo::<TaskEntry>().add(&TaskEntry {
                    id: new_id("entry"),
                    task_id: task_id.to_string(),
                    date,
                    time: now,
                    segment_id: None,
                    segment_name: None,
                    status: status_for(v),
                    completion_value: v,
                    metrics: None,
                    duration: None,
                    tally_count: None,
                })?;
                if let Some(task) = tx.repo::<Task>().get(task_id)? {
                    tx.update(
                        Table::Tasks,
                        task_id,
                        &json!({ "usageCount": task.usage_count + 1, "lastUsed": now }),
                    )?;
                }
            }
            (ToggleOutcome::Updated(v), Some(entry)) => {
                tx.update(
                    Table::TaskEntries,
                    &entry.id,
                    &json!({ "completionValue": v, "status": status_for(v) }),
                )?;
            }
            (ToggleOutcome::Removed, Some(entry)) => {
                tx.delete(Table::TaskEntries, &entry.id)?;
            }
            // decide() only yields Updated/Removed for an existing entry
            (_, None) => {}
        }
        Ok(outcome)
    })
}

fn entries_on(db: &Database, date: &NaiveDate) -> AppResult<Vec<TaskEntry>> {
    db.repo::<TaskEntry>().find_by("date", date.to_string())
}

/// Completion entries of a single day.
pub struct TaskCompletionHook {
    inner: Optimistic<Vec<TaskEntry>, NaiveDate>,
}

impl TaskCompletionHook {
    pub fn new(db: Rc<Database>, date: NaiveDate) -> Self {
        Self {
            inner: Optimistic::new(db, date, entries_on),
        }
    }

    pub fn value(&mut self) -> Option<&Vec<TaskEntry>> {
        self.inner.value()
    }

    pub fn error(&self) -> Option<&str> {
        self.inner.error()
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.inner.set_deps(date);
    }

    /// Completion value recorded for `task_id` on the hook's day.
    pub fn completion_of(&mut self, task_id: &str) -> Option<f64> {
        self.inner
            .value()?
            .iter()
            .find(|e| e.task_id == task_id)
            .map(|e| e.completion_value)
    }

    pub fn toggle(&mut self, task_id: &str, value: f64) -> ToggleOutcome {
        let date = self.inner.deps();
        let mut next = self.inner.value().cloned().unwrap_or_default();
        let pos = next.iter().position(|e| e.task_id == task_id);
        let outcome = decide(pos.map(|i| next[i].completion_value), value);

        match (outcome, pos) {
            (ToggleOutcome::Created(v), _) => next.push(TaskEntry {
                id: new_id("entry"),
                task_id: task_id.to_string(),
                date,
                time: Utc::now(),
                segment_id: None,
                segment_name: None,
                status: status_for(v),
                completion_value: v,
                metrics: None,
                duration: None,
                tally_count: None,
            }),
            (ToggleOutcome::Updated(v), Some(i)) => {
                next[i].completion_value = v;
                next[i].status = status_for(v);
            }
            (ToggleOutcome::Removed, Some(i)) => {
                next.remove(i);
            }
            (_, None) => {}
        }

        let task_id = task_id.to_string();
        self.inner.apply(next, move |db| {
            toggle_task_completion(db, &task_id, date, value).map(|_| ())
        });
        outcome
    }

    pub fn settle(&mut self) -> AppResult<()> {
        self.inner.settle()
    }
}
