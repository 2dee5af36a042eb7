use crate::db::{Database, Store, defaults};
use crate::errors::{AppError, AppResult};
use crate::models::Segment;
use chrono::NaiveTime;

pub struct SegmentLogic;

impl SegmentLogic {
    /// Segments ordered by start time, starting from the earliest window of
    /// the day.
    pub fn list(db: &Database) -> AppResult<Vec<Segment>> {
        let mut segments = db.repo::<Segment>().list()?;
        segments.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(segments)
    }

    /// The segment whose window contains `t`.
    pub fn for_time(db: &Database, t: NaiveTime) -> AppResult<Option<Segment>> {
        for s in Self::list(db)? {
            if s.contains(t)? {
                return Ok(Some(s));
            }
        }
        Ok(None)
    }

    pub fn find(db: &Database, id_or_name: &str) -> AppResult<Segment> {
        let repo = db.repo::<Segment>();
        if let Some(s) = repo.get(id_or_name)? {
            return Ok(s);
        }
        repo.list()?
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(id_or_name))
            .ok_or_else(|| AppError::NotFound {
                table: "segments",
                id: id_or_name.to_string(),
            })
    }

    /// Rename a segment. Check-ins keep the name they were recorded with.
    pub fn rename(db: &Database, id: &str, name: &str) -> AppResult<()> {
        let segment = Self::find(db, id)?;
        db.repo::<Segment>()
            .update(&segment.id, &serde_json::json!({ "name": name }))?;
        Ok(())
    }

    /// Throw away the current segments and restore the six defaults, in one
    /// transaction.
    pub fn reset(db: &Database) -> AppResult<Vec<Segment>> {
        let fresh = defaults::segments();
        db.repo::<Segment>().bulk_replace(&fresh)?;
        Ok(fresh)
    }
}
