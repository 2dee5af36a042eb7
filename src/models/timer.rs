use crate::db::{Entity, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stopwatch or countdown run. `completion_value` always equals
/// `completion_percentage / 100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub id: String,
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub completion_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_session_id: Option<String>,
}

impl Entity for TimerSession {
    const TABLE: Table = Table::TimerSessions;

    fn id(&self) -> &str {
        &self.id
    }
}

impl TimerSession {
    pub fn is_complete(&self) -> bool {
        self.completion_percentage >= 100.0
    }
}
