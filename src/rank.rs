use crate::record::ParseKeyError;
use crate::stats::{GroupStat, GroupStats};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankBy {
    #[default]
    Count,
    Total,
    Average,
}

impl RankBy {
    pub fn value(&self, g: &GroupStat) -> f64 {
        match self {
            RankBy::Count => g.count as f64,
            RankBy::Total => g.total,
            RankBy::Average => g.average,
        }
    }
}

impl FromStr for RankBy {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" | "visits" => Ok(RankBy::Count),
            "total" | "sum" => Ok(RankBy::Total),
            "average" | "avg" => Ok(RankBy::Average),
            _ => Err(ParseKeyError { kind: "ranking metric", value: s.to_string() }),
        }
    }
}

pub fn top_k(stats: &GroupStats, k: usize, by: RankBy) -> Vec<GroupStat> {
    top_k_by(&stats.groups, k, |g| by.value(g))
}

/// Highest `k` items by `metric`, descending. The sort is stable, so equal
/// values keep their input order.
pub fn top_k_by<T, F>(items: &[T], k: usize, metric: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut ranked: Vec<(f64, &T)> = items.iter().map(|it| (metric(it), it)).collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    ranked.into_iter().take(k).map(|(_, it)| it.clone()).collect()
}
