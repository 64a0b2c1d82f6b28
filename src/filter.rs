use crate::record::VisitorEvent;
use crate::timestamp::{parse_day, start_of_day};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("invalid date bound '{0}': expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),
}

/// One end of a date range. A bare calendar day covers that whole UTC day on
/// either side of the range; an instant is compared as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl DateBound {
    /// `Ok(None)` for blank input.
    pub fn parse(s: &str) -> Result<Option<Self>, CriteriaError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        if let Some(day) = parse_day(s) {
            return Ok(Some(DateBound::Day(day)));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(DateBound::Instant(dt.with_timezone(&Utc))))
            .map_err(|_| CriteriaError::InvalidDate(s.to_string()))
    }

    fn admits_from(&self, t: DateTime<Utc>) -> bool {
        match self {
            DateBound::Day(d) => t >= start_of_day(*d),
            DateBound::Instant(i) => t >= *i,
        }
    }

    fn admits_until(&self, t: DateTime<Utc>) -> bool {
        match self {
            DateBound::Day(d) => d.succ_opt().map_or(true, |next| t < start_of_day(next)),
            DateBound::Instant(i) => t <= *i,
        }
    }
}

/// Filter inputs. Blank search and `None` fields impose no constraint.
/// `ip` and `url` are case-sensitive substrings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub ip: Option<String>,
    pub url: Option<String>,
    pub start: Option<DateBound>,
    pub end: Option<DateBound>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = text.to_string();
        self
    }

    pub fn company(mut self, name: &str) -> Self {
        self.company = non_blank(name);
        self
    }

    pub fn location(mut self, name: &str) -> Self {
        self.location = non_blank(name);
        self
    }

    pub fn ip(mut self, needle: &str) -> Self {
        self.ip = non_blank(needle);
        self
    }

    pub fn url(mut self, needle: &str) -> Self {
        self.url = non_blank(needle);
        self
    }

    pub fn start(mut self, bound: DateBound) -> Self {
        self.start = Some(bound);
        self
    }

    pub fn end(mut self, bound: DateBound) -> Self {
        self.end = Some(bound);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.company.is_none()
            && self.location.is_none()
            && self.ip.is_none()
            && self.url.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    pub fn matches(&self, e: &VisitorEvent) -> bool {
        self.matches_search(e)
            && self.company.as_deref().map(|c| e.company.as_str() == c).unwrap_or(true)
            && self.location.as_deref().map(|l| e.location.as_str() == l).unwrap_or(true)
            && self.ip.as_deref().map(|n| e.ip.contains(n)).unwrap_or(true)
            && self.url.as_deref().map(|n| e.url.known().is_some_and(|u| u.contains(n))).unwrap_or(true)
            && self.start.map(|b| b.admits_from(e.timestamp)).unwrap_or(true)
            && self.end.map(|b| b.admits_until(e.timestamp)).unwrap_or(true)
    }

    fn matches_search(&self, e: &VisitorEvent) -> bool {
        let needle = self.search.as_str();
        if needle.is_empty() {
            return true;
        }
        match e.company.known() {
            Some(company) => company.to_lowercase().contains(&needle.to_lowercase()),
            None => false,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

/// Stable filter: survivors keep their input order.
pub fn filter(events: &[VisitorEvent], criteria: &FilterCriteria) -> Vec<VisitorEvent> {
    let out: Vec<VisitorEvent> = events.iter().filter(|e| criteria.matches(e)).cloned().collect();
    debug!(input = events.len(), kept = out.len(), "filtered visitor events");
    out
}
