//! Timer sessions of one task.

use crate::db::{Database, Store, Table};
use crate::errors::{AppError, AppResult};
use crate::hooks::Optimistic;
use crate::models::TimerSession;
use crate::utils::id::new_id;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::rc::Rc;

/// Partial update of a timer session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerPatch {
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<u64>,
    pub completion_percentage: Option<f64>,
    pub completion_value: Option<f64>,
    pub mood: Option<u8>,
}

impl TimerPatch {
    /// Derive `completion_value` from `completion_percentage` unless given.
    pub fn normalized(mut self) -> Self {
        if let Some(p) = self.completion_percentage
            && self.completion_value.is_none()
        {
            self.completion_value = Some(p / 100.0);
        }
        self
    }

    pub fn apply_to(&self, s: &mut TimerSession) {
        if let Some(v) = self.end_time {
            s.end_time = Some(v);
        }
        if let Some(v) = self.duration {
            s.duration = v;
        }
        if let Some(v) = self.completion_percentage {
            s.completion_percentage = v;
        }
        if let Some(v) = self.completion_value {
            s.completion_value = v;
        }
        if let Some(v) = self.mood {
            s.mood = Some(v);
        }
    }

    fn to_json(&self) -> Value {
        let mut m = Map::new();
        if let Some(v) = self.end_time {
            m.insert("endTime".into(), json!(v));
        }
        if let Some(v) = self.duration {
            m.insert("duration".into(), json!(v));
        }
        if let Some(v) = self.completion_percentage {
            m.insert("completionPercentage".into(), json!(v));
        }
        if let Some(v) = self.completion_value {
            m.insert("completionValue".into(), json!(v));
        }
        if let Some(v) = self.mood {
            m.insert("mood".into(), json!(v));
        }
        Value::Object(m)
    }
}

/// Store-level update keeping `completionValue` in step with
/// `completionPercentage`. A mood on a session linked to a check-in is
/// copied onto that check-in in the same transaction.
pub fn update_timer_session(store: &impl Store, id: &str, patch: TimerPatch) -> AppResult<()> {
    let patch = patch.normalized();
    store.transaction(&[Table::TimerSessions, Table::CheckIns], |tx| {
        let Some(session) = tx.repo::<TimerSession>().get(id)? else {
            return Err(AppError::NotFound {
                table: Table::TimerSessions.name(),
                id: id.to_string(),
            });
        };
        tx.update(Table::TimerSessions, id, &patch.to_json())?;

        if let (Some(mood), Some(check_in)) = (patch.mood, &session.check_in_id) {
            tx.update(Table::CheckIns, check_in, &json!({ "mood": mood }))?;
        }
        Ok(())
    })
}

fn sessions_for(db: &Database, task_id: &String) -> AppResult<Vec<TimerSession>> {
    let mut sessions = db.repo::<TimerSession>().find_by("taskId", task_id.as_str())?;
    sessions.sort_by_key(|s| s.start_time);
    Ok(sessions)
}

pub struct TimerSessionsHook {
    inner: Optimistic<Vec<TimerSession>, String>,
}

impl TimerSessionsHook {
    pub fn new(db: Rc<Database>, task_id: impl Into<String>) -> Self {
        Self {
            inner: Optimistic::new(db, task_id.into(), sessions_for),
        }
    }

    pub fn value(&mut self) -> Option<&Vec<TimerSession>> {
        self.inner.value()
    }

    pub fn error(&self) -> Option<&str> {
        self.inner.error()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    /// Follow another task; the list reloads on the next pump.
    pub fn set_task(&mut self, task_id: impl Into<String>) {
        self.inner.set_deps(task_id.into());
    }

    fn current(&mut self) -> Vec<TimerSession> {
        self.inner.value().cloned().unwrap_or_default()
    }

    fn push(&mut self, session: TimerSession) -> TimerSession {
        let mut next = self.current();
        next.push(session.clone());
        let write = session.clone();
        self.inner
            .apply(next, move |db| db.repo::<TimerSession>().add(&write));
        session
    }

    pub fn start(&mut self, check_in_id: Option<String>) -> TimerSession {
        self.push(TimerSession {
            id: new_id("timer"),
            task_id: self.inner.deps(),
            start_time: Utc::now(),
            end_time: None,
            duration: 0,
            completion_percentage: 0.0,
            completion_value: 0.0,
            mood: None,
            check_in_id,
            previous_session_id: None,
        })
    }

    /// Resume an incomplete session as a new one linked to it.
    pub fn continue_session(&mut self, previous_id: &str) -> AppResult<TimerSession> {
        let previous = self
            .current()
            .into_iter()
            .find(|s| s.id == previous_id)
            .ok_or_else(|| AppError::NotFound {
                table: Table::TimerSessions.name(),
                id: previous_id.to_string(),
            })?;
        if previous.is_complete() {
            return Err(AppError::Invalid(format!(
                "session {previous_id} is already complete"
            )));
        }

        Ok(self.push(TimerSession {
            id: new_id("timer"),
            task_id: previous.task_id.clone(),
            start_time: Utc::now(),
            end_time: None,
            duration: 0,
            completion_percentage: previous.completion_percentage,
            completion_value: previous.completion_percentage / 100.0,
            mood: None,
            check_in_id: previous.check_in_id.clone(),
            previous_session_id: Some(previous.id),
        }))
    }

    pub fn update(&mut self, id: &str, patch: TimerPatch) -> AppResult<bool> {
        let patch = patch.normalized();
        let mut next = self.current();
        let session = next
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound {
                table: Table::TimerSessions.name(),
                id: id.to_string(),
            })?;
        patch.apply_to(session);

        let id = id.to_string();
        Ok(self
            .inner
            .apply(next, move |db| update_timer_session(db, &id, patch)))
    }

    pub fn set_mood(&mut self, id: &str, mood: u8) -> AppResult<bool> {
        if !(1..=10).contains(&mood) {
            return Err(AppError::Invalid(format!("mood must be between 1 and 10, got {mood}")));
        }
        self.update(
            id,
            TimerPatch {
                mood: Some(mood),
                ..Default::default()
            },
        )
    }

    pub fn settle(&mut self) -> AppResult<()> {
        self.inner.settle()
    }
}
