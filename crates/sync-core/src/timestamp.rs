//! Conversions between calendar values and the remote store's numeric
//! timestamps (seconds since 1970-01-01T00:00:00 UTC).

use crate::error::{Error, Result};
use crate::values::CellValue;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// 1970-01-01, the date the timestamps count from.
pub fn date_epoch() -> NaiveDate {
    NaiveDate::default()
}

/// 1970-01-01T00:00:00, the naive date/time the timestamps count from.
pub fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Converts a date to the timestamp of its UTC midnight.
pub fn date_to_ts(date: NaiveDate) -> f64 {
    (date - date_epoch()).num_seconds() as f64
}

/// Converts a timestamp to the calendar date it falls on.
///
/// Partial days are floored, so any second of a day maps to that day.
pub fn ts_to_date(ts: f64) -> Result<NaiveDate> {
    let days = (ts / SECONDS_PER_DAY).floor();
    if !days.is_finite() || days.abs() > i32::MAX as f64 {
        return Err(Error::validation(format!(
            "timestamp {ts} is outside the supported date range"
        )));
    }
    TimeDelta::try_days(days as i64)
        .and_then(|delta| date_epoch().checked_add_signed(delta))
        .ok_or_else(|| {
            Error::validation(format!("timestamp {ts} is outside the supported date range"))
        })
}

/// Converts a timestamp to a naive date/time representing UTC.
pub fn ts_to_dt(ts: f64) -> Result<NaiveDateTime> {
    let micros = (ts * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(Error::validation(format!(
            "timestamp {ts} is outside the supported date/time range"
        )));
    }
    epoch()
        .checked_add_signed(TimeDelta::microseconds(micros as i64))
        .ok_or_else(|| {
            Error::validation(format!(
                "timestamp {ts} is outside the supported date/time range"
            ))
        })
}

/// Converts a naive date/time (taken as UTC) to a timestamp.
pub fn dt_to_ts(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_micros() as f64 / 1_000_000.0
}

/// Converts an offset-aware date/time to a timestamp, honouring its offset.
pub fn zoned_dt_to_ts(dt: &DateTime<FixedOffset>) -> f64 {
    dt.timestamp_micros() as f64 / 1_000_000.0
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse an ISO 8601 date/time. Strings carrying an offset become
/// [`CellValue::ZonedDateTime`], the rest [`CellValue::DateTime`].
pub fn parse_iso_datetime(s: &str) -> Option<CellValue> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(CellValue::ZonedDateTime(dt));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(CellValue::DateTime)
}
