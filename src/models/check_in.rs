use crate::db::{Entity, Table};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Wellbeing snapshot. `segment_name` is copied from the segment when the
/// check-in is created and never follows later renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: String,
    pub date: NaiveDate,
    pub time: DateTime<Utc>,
    pub segment_id: String,
    pub segment_name: String,
    pub mood: u8,
    pub energy: u8,
    pub focus: u8,
    pub stress: u8,
    pub motivation: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_analysis: Option<String>,
}

impl Entity for CheckIn {
    const TABLE: Table = Table::CheckIns;

    fn id(&self) -> &str {
        &self.id
    }
}

/// The five metric fields every check-in carries, in display order.
pub const CHECK_IN_METRICS: [&str; 5] = ["mood", "energy", "focus", "stress", "motivation"];

impl CheckIn {
    pub fn metrics(&self) -> [u8; 5] {
        [self.mood, self.energy, self.focus, self.stress, self.motivation]
    }

    pub fn validate(&self) -> AppResult<()> {
        for (name, v) in CHECK_IN_METRICS.iter().zip(self.metrics()) {
            if !(1..=10).contains(&v) {
                return Err(AppError::Invalid(format!("{name} must be between 1 and 10, got {v}")));
            }
        }
        Ok(())
    }
}
