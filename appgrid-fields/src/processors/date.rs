//! ISO-8601 date and datetime processors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use super::FieldProcessor;
use crate::error::FieldError;
use crate::types::FieldDef;
use crate::value::Value;

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calendar dates, stored as `YYYY-MM-DD`.
pub struct DateProcessor;

impl FieldProcessor for DateProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        value
            .as_str()
            .and_then(parse_date)
            .map(|_| ())
            .ok_or_else(|| FieldError::new("must be an ISO-8601 date"))
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        value
            .as_str()
            .and_then(parse_date)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_default()
    }
}

/// Instants, stored as RFC 3339 in UTC.
pub struct DateTimeProcessor;

impl FieldProcessor for DateTimeProcessor {
    fn validate(&self, value: &JsonValue, _field: &FieldDef) -> Result<(), FieldError> {
        value
            .as_str()
            .and_then(parse_datetime)
            .map(|_| ())
            .ok_or_else(|| FieldError::new("must be an ISO-8601 datetime"))
    }

    fn transform(&self, value: &JsonValue, _field: &FieldDef) -> Value {
        value
            .as_str()
            .and_then(parse_datetime)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .unwrap_or_default()
    }
}
