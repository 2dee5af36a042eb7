use crate::errors::{AppError, AppResult};
use chrono::{NaiveDate, NaiveTime};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn now_hhmm() -> NaiveTime {
    chrono::Local::now().time()
}

/// Parse "YYYY-MM-DD", or the keyword `today`.
pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(today());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

pub fn parse_time(s: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| AppError::InvalidTime(s.to_string()))
}
