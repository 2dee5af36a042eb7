use crate::db::{Entity, Table};
use crate::errors::{AppError, AppResult};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Named time-of-day window. `end_time` earlier than `start_time` wraps
/// past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub name: String,
    pub start_time: String, // "HH:MM"
    pub end_time: String,   // "HH:MM"
    pub color: String,
}

impl Entity for Segment {
    const TABLE: Table = Table::Segments;

    fn id(&self) -> &str {
        &self.id
    }
}

pub fn parse_hhmm(s: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| AppError::InvalidTime(s.to_string()))
}

impl Segment {
    pub fn window(&self) -> AppResult<(NaiveTime, NaiveTime)> {
        Ok((parse_hhmm(&self.start_time)?, parse_hhmm(&self.end_time)?))
    }

    /// Whether `t` falls in `[start, end)`, honouring wraparound.
    pub fn contains(&self, t: NaiveTime) -> AppResult<bool> {
        let (start, end) = self.window()?;
        Ok(if start < end {
            start <= t && t < end
        } else {
            // wraps midnight (or covers the whole day when start == end)
            t >= start || t < end
        })
    }

    /// Length of the window in minutes.
    pub fn minutes(&self) -> AppResult<i64> {
        let (start, end) = self.window()?;
        let d = (end - start).num_minutes();
        Ok(if d <= 0 { d + 24 * 60 } else { d })
    }
}
