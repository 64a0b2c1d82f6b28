use crate::record::{Category, GroupKey, Metric, VisitorEvent};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// How records whose grouping key is absent take part in grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// Absent values are grouped under the `Unknown` placeholder.
    #[default]
    Include,
    /// Absent values are left out (ranking views).
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub count: usize,
    /// Records in the group that carried the metric.
    pub measured: usize,
    pub total: f64,
    pub average: f64,
}

impl GroupStat {
    fn new(key: &str) -> Self {
        Self { key: key.to_string(), count: 0, measured: 0, total: 0.0, average: 0.0 }
    }
}

/// Groups in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GroupStats {
    pub groups: Vec<GroupStat>,
}

impl GroupStats {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&GroupStat> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupStat> {
        self.groups.iter()
    }

    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}

impl<'a> IntoIterator for &'a GroupStats {
    type Item = &'a GroupStat;
    type IntoIter = std::slice::Iter<'a, GroupStat>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

pub fn group_stats(events: &[VisitorEvent], key: GroupKey, metric: Metric, policy: UnknownPolicy) -> GroupStats {
    group_stats_by(events, |e| e.category(key), |e| e.metric(metric), policy)
}

/// Average is `total / measured`, and 0 for a group where no record carried
/// the metric.
pub fn group_stats_by<K, M>(events: &[VisitorEvent], key_fn: K, metric_fn: M, policy: UnknownPolicy) -> GroupStats
where
    K: Fn(&VisitorEvent) -> &Category,
    M: Fn(&VisitorEvent) -> Option<f64>,
{
    let mut groups: Vec<GroupStat> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for e in events {
        let cat = key_fn(e);
        if policy == UnknownPolicy::Skip && !cat.is_known() {
            continue;
        }
        let name = cat.as_str();
        let idx = match slot.get(name) {
            Some(&i) => i,
            None => {
                groups.push(GroupStat::new(name));
                slot.insert(name.to_string(), groups.len() - 1);
                groups.len() - 1
            }
        };
        let g = &mut groups[idx];
        g.count += 1;
        if let Some(v) = metric_fn(e) {
            g.measured += 1;
            g.total += v;
        }
    }
    for g in groups.iter_mut() {
        g.average = if g.measured > 0 { g.total / g.measured as f64 } else { 0.0 };
    }
    debug!(groups = groups.len(), "grouped statistics");
    GroupStats { groups }
}

/// Headline numbers for a filtered set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_visits: usize,
    /// Mean time on page in seconds; 0 for an empty set.
    pub average_time_on_page: f64,
    pub unique_companies: usize,
}

pub fn overview(events: &[VisitorEvent]) -> Overview {
    let total_visits = events.len();
    let (measured, total) = events
        .iter()
        .filter_map(|e| e.time_on_page)
        .fold((0usize, 0.0f64), |(n, sum), t| (n + 1, sum + t));
    let average_time_on_page = if measured > 0 { total / measured as f64 } else { 0.0 };
    let unique_companies = events.iter().map(|e| e.company.as_str()).unique().count();
    Overview { total_visits, average_time_on_page, unique_companies }
}

/// Distinct selector values, in the order they first appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub companies: Vec<String>,
    pub locations: Vec<String>,
}

pub fn facets(events: &[VisitorEvent]) -> Facets {
    Facets {
        companies: distinct(events, GroupKey::Company),
        locations: distinct(events, GroupKey::Location),
    }
}

pub fn distinct(events: &[VisitorEvent], key: GroupKey) -> Vec<String> {
    events
        .iter()
        .map(|e| e.category(key).as_str())
        .unique()
        .map(str::to_string)
        .collect()
}
