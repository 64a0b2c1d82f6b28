use crate::filter::{filter, FilterCriteria};
use crate::rank::{top_k, RankBy};
use crate::recent::recent;
use crate::record::{GroupKey, Metric, VisitorEvent};
use crate::stats::{facets, group_stats, overview, Facets, GroupStat, Overview, UnknownPolicy};
use crate::trend::{aggregate_trend_at, daily_visits, DailyCount, TrendSeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DashboardOpts {
    pub window_days: usize,
    pub max_series: usize,
    pub top_k: usize,
    pub rank_by: RankBy,
    pub recent_n: usize,
    pub detail_limit: usize,
    pub trend_key: GroupKey,
    pub ranking_key: GroupKey,
    /// Compute independent views on the rayon pool.
    pub parallel: bool,
}

impl Default for DashboardOpts {
    fn default() -> Self {
        Self {
            window_days: 14,
            max_series: 5,
            top_k: 5,
            rank_by: RankBy::Count,
            recent_n: 10,
            detail_limit: 50,
            trend_key: GroupKey::Company,
            ranking_key: GroupKey::Company,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardOut {
    pub facets: Facets,
    pub matched: usize,
    pub overview: Overview,
    pub trend: TrendSeries,
    pub daily_visits: Vec<DailyCount>,
    pub top: Vec<GroupStat>,
    pub recent: Vec<VisitorEvent>,
    pub details: Vec<VisitorEvent>,
}

struct Views {
    overview: Overview,
    trend: TrendSeries,
    daily_visits: Vec<DailyCount>,
    top: Vec<GroupStat>,
    recent: Vec<VisitorEvent>,
}

/// Recomputes every view from the full record set for one set of criteria.
/// Facets come from the full set so selectors stay stable while filtering.
pub fn build_dashboard(
    all: &[VisitorEvent],
    criteria: &FilterCriteria,
    opts: &DashboardOpts,
    today: NaiveDate,
) -> DashboardOut {
    let filtered = filter(all, criteria);
    let views = if opts.parallel {
        compute_parallel(&filtered, opts, today)
    } else {
        compute_sequential(&filtered, opts, today)
    };
    let facets = facets(all);
    let details: Vec<VisitorEvent> = filtered.iter().take(opts.detail_limit).cloned().collect();
    info!(total = all.len(), matched = filtered.len(), "assembled dashboard");
    DashboardOut {
        facets,
        matched: filtered.len(),
        overview: views.overview,
        trend: views.trend,
        daily_visits: views.daily_visits,
        top: views.top,
        recent: views.recent,
        details,
    }
}

fn ranked(events: &[VisitorEvent], opts: &DashboardOpts) -> Vec<GroupStat> {
    let stats = group_stats(events, opts.ranking_key, Metric::TimeOnPage, UnknownPolicy::Skip);
    top_k(&stats, opts.top_k, opts.rank_by)
}

fn compute_sequential(events: &[VisitorEvent], opts: &DashboardOpts, today: NaiveDate) -> Views {
    Views {
        overview: overview(events),
        trend: aggregate_trend_at(events, opts.trend_key, today, opts.window_days, opts.max_series),
        daily_visits: daily_visits(events, today, opts.window_days),
        top: ranked(events, opts),
        recent: recent(events, opts.recent_n),
    }
}

fn compute_parallel(events: &[VisitorEvent], opts: &DashboardOpts, today: NaiveDate) -> Views {
    let ((overview, trend), ((daily_visits, top), recent)) = rayon::join(
        || {
            rayon::join(
                || overview(events),
                || aggregate_trend_at(events, opts.trend_key, today, opts.window_days, opts.max_series),
            )
        },
        || {
            rayon::join(
                || rayon::join(|| daily_visits(events, today, opts.window_days), || ranked(events, opts)),
                || recent(events, opts.recent_n),
            )
        },
    );
    Views { overview, trend, daily_visits, top, recent }
}
