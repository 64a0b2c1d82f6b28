use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder used for any descriptive field the record did not carry.
pub const UNKNOWN: &str = "Unknown";

/// A visitor event exactly as the record source hands it over.
/// Fields not listed here are ignored. Values are kept loosely typed so a
/// mistyped field is reported per record by the normalizer instead of
/// failing the whole log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub ip: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub company: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub industry: Option<Value>,
    #[serde(default)]
    pub referrer: Option<Value>,
    #[serde(default)]
    pub traffic_source: Option<Value>,
    #[serde(default)]
    pub user_agent: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub time_on_page: Option<Value>,
    #[serde(default)]
    pub pages_viewed: Option<Value>,
    #[serde(default)]
    pub visit_count: Option<Value>,
}

/// A descriptive field after normalization. `Unknown` displays, compares and
/// groups as the `"Unknown"` placeholder, but stays distinguishable from a
/// record that literally carried that string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Known(String),
    #[default]
    Unknown,
}

impl Category {
    /// Trims the value; empty or missing input becomes `Unknown`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if !s.is_empty() => Category::Known(s.to_string()),
            _ => Category::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Known(s) => s,
            Category::Unknown => UNKNOWN,
        }
    }

    pub fn known(&self) -> Option<&str> {
        match self {
            Category::Known(s) => Some(s),
            Category::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Category::Known(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Canonical visitor event. Timestamps are always UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitorEvent {
    pub ip: String,
    pub url: Category,
    pub company: Category,
    pub location: Category,
    pub industry: Category,
    pub referrer: Category,
    pub traffic_source: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub time_on_page: Option<f64>,
    pub pages_viewed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<u64>,
}

impl VisitorEvent {
    /// Minimal event with every descriptive field unknown.
    pub fn new(ip: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            ip: ip.into(),
            url: Category::Unknown,
            company: Category::Unknown,
            location: Category::Unknown,
            industry: Category::Unknown,
            referrer: Category::Unknown,
            traffic_source: Category::Unknown,
            user_agent: None,
            timestamp,
            time_on_page: None,
            pages_viewed: None,
            visit_count: None,
        }
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.company = Category::from_raw(Some(company));
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Category::from_raw(Some(location));
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Category::from_raw(Some(url));
        self
    }

    pub fn with_time_on_page(mut self, secs: f64) -> Self {
        self.time_on_page = Some(secs);
        self
    }

    pub fn category(&self, key: GroupKey) -> &Category {
        match key {
            GroupKey::Company => &self.company,
            GroupKey::Location => &self.location,
            GroupKey::Industry => &self.industry,
            GroupKey::Url => &self.url,
            GroupKey::Referrer => &self.referrer,
            GroupKey::TrafficSource => &self.traffic_source,
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TimeOnPage => self.time_on_page,
            Metric::PagesViewed => self.pages_viewed.map(|p| p as f64),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseKeyError {
    pub kind: &'static str,
    pub value: String,
}

/// Which descriptive field partitions records for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupKey {
    #[default]
    Company,
    Location,
    Industry,
    Url,
    Referrer,
    TrafficSource,
}

impl FromStr for GroupKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "company" => Ok(GroupKey::Company),
            "location" => Ok(GroupKey::Location),
            "industry" => Ok(GroupKey::Industry),
            "url" | "page" => Ok(GroupKey::Url),
            "referrer" => Ok(GroupKey::Referrer),
            "traffic-source" | "traffic_source" | "source" => Ok(GroupKey::TrafficSource),
            _ => Err(ParseKeyError { kind: "group key", value: s.to_string() }),
        }
    }
}

/// Summable per-record quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    TimeOnPage,
    PagesViewed,
}
