//! Date formatting for attributes declared with a date-like cast.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::{ResourceError, ResourceResult};

const DATE_CASTS: [&str; 4] = ["date:", "datetime:", "immutable_date:", "immutable_datetime:"];

/// The format string of a date-like cast, e.g. `%Y-%m-%d` for `date:%Y-%m-%d`.
pub fn date_format(cast: &str) -> Option<&str> {
    DATE_CASTS
        .iter()
        .find_map(|prefix| cast.strip_prefix(prefix))
        .filter(|format| !format.is_empty())
}

/// Format a date attribute with a `strftime` format; `null` stays `null`.
pub fn format_date(attribute: &str, value: &Value, format: &str) -> ResourceResult<Value> {
    let date = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => parse_date(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|date| date.fixed_offset()),
        _ => None,
    }
    .ok_or_else(|| ResourceError::invalid_cast(attribute, format!("cannot read {value} as a date")))?;

    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| ResourceError::invalid_cast(attribute, format!("invalid date format '{format}'")))?;
    Ok(Value::String(out))
}

fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(date.and_utc().fixed_offset());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|date| date.fixed_offset())
}
