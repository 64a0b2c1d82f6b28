use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Parses a raw timestamp value into a UTC instant.
///
/// Strings may be RFC 3339, ISO 8601 with a `+HHMM` offset, naive date-times
/// (read as UTC), a bare `YYYY-MM-DD` (UTC midnight) or an all-digit epoch.
/// Numbers are epoch seconds (10 digits) or milliseconds (13 digits).
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_ts_candidate(s.trim()),
        Value::Number(n) => n.as_i64().and_then(|i| parse_ts_number_string(&i.to_string())),
        _ => None,
    }
}

pub fn parse_ts_candidate(s: &str) -> Option<DateTime<Utc>> {
    parse_ts_string(s)
        .or_else(|| parse_ts_number_string(s))
        .or_else(|| parse_day(s).map(start_of_day))
}

fn parse_ts_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let offset_fmts = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%:z",
    ];
    for f in offset_fmts.iter() {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    let naive_fmts = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for f in naive_fmts.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

fn parse_ts_number_string(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match s.len() {
        10 => s.parse::<i64>().ok().and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        13 => s.parse::<i64>().ok().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))
}

/// Calendar day of an instant in the reference zone (UTC).
pub fn utc_day(t: DateTime<Utc>) -> NaiveDate {
    t.date_naive()
}
