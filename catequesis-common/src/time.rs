//! Timestamp utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Calendar date format used for every date stored as a string
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current calendar date in UTC
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Format a date as `YYYY-MM-DD`
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(CALENDAR_DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` string
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, CALENDAR_DATE_FORMAT).ok()
}
