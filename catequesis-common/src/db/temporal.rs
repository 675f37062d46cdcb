//! Temporal values inside stored documents
//!
//! Documents are kept as extended JSON. A temporal value is an object with a
//! single `$date` key:
//!
//! - `{"$date": "2015-06-12T00:00:00Z"}` date-time (RFC 3339)
//! - `{"$date": {"$numberLong": "1434067200000"}}` date-time (epoch millis)
//! - `{"$date": "2015-06-12"}` pure calendar date
//!
//! Any other JSON value, including a plain `"2015-06-12"` string, is not temporal.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::time::{format_calendar_date, parse_calendar_date};

const DATE_KEY: &str = "$date";
const NUMBER_LONG_KEY: &str = "$numberLong";

/// A stored temporal value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl Temporal {
    /// Recognize a temporal value; `None` for everything else
    pub fn from_value(value: &Value) -> Option<Temporal> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        match map.get(DATE_KEY)? {
            Value::String(s) => parse_date_string(s),
            Value::Object(inner) if inner.len() == 1 => {
                let millis = inner.get(NUMBER_LONG_KEY)?.as_str()?.parse::<i64>().ok()?;
                DateTime::from_timestamp_millis(millis).map(Temporal::DateTime)
            }
            Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?).map(Temporal::DateTime),
            _ => None,
        }
    }

    /// Encode as extended JSON
    pub fn to_value(&self) -> Value {
        match self {
            Temporal::Date(d) => json!({ "$date": format_calendar_date(*d) }),
            Temporal::DateTime(dt) => {
                json!({ "$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true) })
            }
        }
    }

    /// Calendar-date component; date-times are truncated in UTC
    pub fn calendar_date(&self) -> NaiveDate {
        match self {
            Temporal::Date(d) => *d,
            Temporal::DateTime(dt) => dt.date_naive(),
        }
    }

    /// `YYYY-MM-DD` rendering of the calendar date
    pub fn to_calendar_string(&self) -> String {
        format_calendar_date(self.calendar_date())
    }
}

fn parse_date_string(s: &str) -> Option<Temporal> {
    if let Some(date) = parse_calendar_date(s) {
        return Some(Temporal::Date(date));
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| Temporal::DateTime(dt.with_timezone(&Utc)))
}

/// True when the value is a stored temporal
pub fn is_temporal(value: &Value) -> bool {
    Temporal::from_value(value).is_some()
}

/// Serde adapter storing a `DateTime<Utc>` as `{"$date": ...}`
///
/// Deserialization also accepts a bare RFC 3339 or `YYYY-MM-DD` string, which is
/// what the JSON API receives from clients.
pub mod ext_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        Temporal::DateTime(*dt).to_value().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        datetime_from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("expected a date-time, got {}", value)))
    }

    pub(crate) fn datetime_from_value(value: &Value) -> Option<DateTime<Utc>> {
        let temporal = match value {
            Value::String(s) => parse_date_string(s)?,
            other => Temporal::from_value(other)?,
        };
        Some(match temporal {
            Temporal::DateTime(dt) => dt,
            Temporal::Date(d) => d.and_hms_opt(0, 0, 0)?.and_utc(),
        })
    }
}

/// A calendar date stored as a `YYYY-MM-DD` string
///
/// Reads also accept the legacy temporal encoding so records written before the
/// date normalization still load; writes always produce the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(pub NaiveDate);

impl CalendarDate {
    pub fn today() -> Self {
        Self(crate::time::today())
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_calendar_date(self.0))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) => parse_calendar_date(s)
                .map(CalendarDate)
                .ok_or_else(|| de::Error::custom(format!("expected YYYY-MM-DD, got {:?}", s))),
            other => Temporal::from_value(other)
                .map(|t| CalendarDate(t.calendar_date()))
                .ok_or_else(|| de::Error::custom(format!("expected a calendar date, got {}", other))),
        }
    }
}
