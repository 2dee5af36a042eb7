use crate::core::segments::SegmentLogic;
use crate::db::{Database, Store};
use crate::errors::{AppError, AppResult};
use crate::models::CheckIn;
use crate::utils::id::new_id;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::json;

/// Metric values of a new check-in, each 1..=10.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub mood: u8,
    pub energy: u8,
    pub focus: u8,
    pub stress: u8,
    pub motivation: u8,
}

pub struct CheckInLogic;

impl CheckInLogic {
    /// Record a check-in. Without `segment`, the segment covering the local
    /// clock time of `at` is used. The segment name is snapshotted.
    pub fn record(
        db: &Database,
        at: DateTime<Utc>,
        segment: Option<&str>,
        metrics: Metrics,
        notes: Option<String>,
    ) -> AppResult<CheckIn> {
        let local = at.with_timezone(&Local);
        let segment = match segment {
            Some(s) => SegmentLogic::find(db, s)?,
            None => SegmentLogic::for_time(db, local.time())?.ok_or_else(|| {
                AppError::Invalid(format!("no segment covers {}", local.format("%H:%M")))
            })?,
        };

        let check_in = CheckIn {
            id: new_id("checkin"),
            date: local.date_naive(),
            time: at,
            segment_id: segment.id,
            segment_name: segment.name,
            mood: metrics.mood,
            energy: metrics.energy,
            focus: metrics.focus,
            stress: metrics.stress,
            motivation: metrics.motivation,
            notes,
            recording_url: None,
            transcription: None,
            emotional_analysis: None,
        };
        check_in.validate()?;

        db.repo::<CheckIn>().add(&check_in)?;
        Ok(check_in)
    }

    pub fn on_date(db: &Database, date: NaiveDate) -> AppResult<Vec<CheckIn>> {
        let mut rows = db.repo::<CheckIn>().find_by("date", date.to_string())?;
        rows.sort_by_key(|c| c.time);
        Ok(rows)
    }

    /// Remove the voice transcription (and its analysis) from a check-in.
    pub fn delete_transcription(db: &Database, id: &str) -> AppResult<()> {
        let found = db.repo::<CheckIn>().update(
            id,
            &json!({ "transcription": null, "emotionalAnalysis": null }),
        )?;
        if !found {
            return Err(AppError::NotFound {
                table: "check_ins",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
