use crate::record::{Category, RawRecord, VisitorEvent};
use crate::timestamp;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed record at index {index}: {reason}")]
pub struct MalformedRecordError {
    pub index: usize,
    pub reason: String,
}

impl MalformedRecordError {
    fn new(index: usize, reason: impl Into<String>) -> Self {
        Self { index, reason: reason.into() }
    }
}

pub fn normalize_record(raw: &RawRecord, index: usize) -> Result<VisitorEvent, MalformedRecordError> {
    let ts_value = match raw.timestamp.as_ref() {
        Some(v) if !v.is_null() => v,
        _ => return Err(MalformedRecordError::new(index, "missing timestamp")),
    };
    let timestamp = timestamp::parse_timestamp(ts_value)
        .ok_or_else(|| MalformedRecordError::new(index, format!("unparseable timestamp {ts_value}")))?;

    let text = |v: &Option<Value>, field: &str| text_field(v.as_ref(), field, index);
    let category = |v: &Option<Value>, field: &str| -> Result<Category, MalformedRecordError> {
        Ok(Category::from_raw(text(v, field)?.as_deref()))
    };

    Ok(VisitorEvent {
        ip: text(&raw.ip, "ip")?.map(|s| s.trim().to_string()).unwrap_or_default(),
        url: category(&raw.url, "url")?,
        company: category(&raw.company, "company")?,
        location: category(&raw.location, "location")?,
        industry: category(&raw.industry, "industry")?,
        referrer: category(&raw.referrer, "referrer")?,
        traffic_source: category(&raw.traffic_source, "trafficSource")?,
        user_agent: text(&raw.user_agent, "userAgent")?.filter(|s| !s.trim().is_empty()),
        timestamp,
        time_on_page: seconds_field(raw.time_on_page.as_ref(), "timeOnPage", index)?,
        pages_viewed: count_field(raw.pages_viewed.as_ref(), "pagesViewed", index)?,
        visit_count: count_field(raw.visit_count.as_ref(), "visitCount", index)?,
    })
}

/// Strings pass through; numbers and booleans take their JSON text.
fn text_field(v: Option<&Value>, field: &str, index: usize) -> Result<Option<String>, MalformedRecordError> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(MalformedRecordError::new(index, format!("invalid {field} {other}: expected text"))),
    }
}

/// Non-negative finite seconds. Numeric strings are accepted; blank means absent.
fn seconds_field(v: Option<&Value>, field: &str, index: usize) -> Result<Option<f64>, MalformedRecordError> {
    let secs = match v {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match secs {
        Some(t) if t.is_finite() && t >= 0.0 => Ok(Some(t)),
        _ => Err(MalformedRecordError::new(index, format!("invalid {field} {}", v.map(Value::to_string).unwrap_or_default()))),
    }
}

/// Non-negative whole number. `2.0` and `"2"` are accepted; blank means absent.
fn count_field(v: Option<&Value>, field: &str, index: usize) -> Result<Option<u64>, MalformedRecordError> {
    let count = match v {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    count
        .map(Some)
        .ok_or_else(|| MalformedRecordError::new(index, format!("invalid {field} {}", v.map(Value::to_string).unwrap_or_default())))
}

fn whole(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// Normalizes every record, stopping at the first malformed one.
pub fn normalize(raws: &[RawRecord]) -> Result<Vec<VisitorEvent>, MalformedRecordError> {
    let events = raws
        .iter()
        .enumerate()
        .map(|(i, r)| normalize_record(r, i))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(records = events.len(), "normalized visitor records");
    Ok(events)
}

/// Keeps every well-formed record and returns the errors for the rest.
pub fn normalize_lenient(raws: &[RawRecord]) -> (Vec<VisitorEvent>, Vec<MalformedRecordError>) {
    let mut events = Vec::with_capacity(raws.len());
    let mut errors = Vec::new();
    for (i, r) in raws.iter().enumerate() {
        match normalize_record(r, i) {
            Ok(e) => events.push(e),
            Err(e) => {
                warn!(index = e.index, reason = %e.reason, "dropping malformed record");
                errors.push(e);
            }
        }
    }
    (events, errors)
}
