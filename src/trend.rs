use crate::record::{GroupKey, VisitorEvent};
use crate::timestamp::utc_day;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub key: String,
    pub counts: Vec<usize>,
}

/// Per-group daily counts; every `counts` vector is aligned with `labels`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub labels: Vec<NaiveDate>,
    pub series: Vec<Series>,
}

impl TrendSeries {
    pub fn total(&self) -> usize {
        self.series.iter().map(|s| s.counts.iter().sum::<usize>()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: usize,
}

/// `window_days` consecutive days ending at `today`, oldest first. A window
/// reaching past the earliest representable date starts at that date.
pub fn day_labels(today: NaiveDate, window_days: usize) -> Vec<NaiveDate> {
    if window_days == 0 {
        return Vec::new();
    }
    let first = today
        .checked_sub_days(Days::new(window_days as u64 - 1))
        .unwrap_or(NaiveDate::MIN);
    first.iter_days().take_while(|d| *d <= today).collect()
}

/// Company trend over the trailing window ending today (UTC).
pub fn aggregate_trend(events: &[VisitorEvent], window_days: usize, max_series: usize) -> TrendSeries {
    let today = Utc::now().date_naive();
    aggregate_trend_at(events, GroupKey::Company, today, window_days, max_series)
}

/// Groups are taken in the order their first in-window record appears, and
/// only the first `max_series` of them are reported. This is discovery order,
/// not a ranking by volume.
pub fn aggregate_trend_at(
    events: &[VisitorEvent],
    key: GroupKey,
    today: NaiveDate,
    window_days: usize,
    max_series: usize,
) -> TrendSeries {
    let labels = day_labels(today, window_days);
    let Some(&first_day) = labels.first() else {
        return TrendSeries::default();
    };

    let mut series: Vec<Series> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for e in events {
        let day = utc_day(e.timestamp);
        if day < first_day || day > today {
            continue;
        }
        let name = e.category(key).as_str();
        let idx = match slot.get(name) {
            Some(&i) => i,
            None => {
                if series.len() >= max_series {
                    continue;
                }
                series.push(Series { key: name.to_string(), counts: vec![0; labels.len()] });
                slot.insert(name, series.len() - 1);
                series.len() - 1
            }
        };
        let bucket = (day - first_day).num_days() as usize;
        series[idx].counts[bucket] += 1;
    }

    debug!(days = labels.len(), series = series.len(), "aggregated trend");
    TrendSeries { labels, series }
}

/// Ungrouped visits per day over the same trailing window.
pub fn daily_visits(events: &[VisitorEvent], today: NaiveDate, window_days: usize) -> Vec<DailyCount> {
    let labels = day_labels(today, window_days);
    let Some(&first_day) = labels.first() else {
        return Vec::new();
    };
    let mut counts = vec![0usize; labels.len()];
    for e in events {
        let day = utc_day(e.timestamp);
        if day >= first_day && day <= today {
            counts[(day - first_day).num_days() as usize] += 1;
        }
    }
    labels
        .into_iter()
        .zip(counts)
        .map(|(day, count)| DailyCount { day, count })
        .collect()
}
