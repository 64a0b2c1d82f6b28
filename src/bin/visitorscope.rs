use anyhow::Context;
use chrono::{NaiveDate, SecondsFormat, Utc};
use clap::Parser;
use std::io;
use std::sync::Once;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use visitorscope::dashboard::{build_dashboard, DashboardOpts, DashboardOut};
use visitorscope::filter::{DateBound, FilterCriteria};
use visitorscope::rank::RankBy;
use visitorscope::record::{GroupKey, RawRecord, VisitorEvent};
use visitorscope::source::{load_from_reader, JsonFileSource, RecordSource};
use visitorscope::{normalize, timestamp};

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

#[derive(Parser, Debug)]
#[command(name = "visitorscope", version, about = "Visitor log analytics")]
struct Cli {
    /// Visitor log (JSON array or JSON lines). `-` or omitted reads stdin.
    input: Option<String>,

    /// Case-insensitive substring of the company name
    #[arg(long = "search", default_value = "")] search: String,
    #[arg(long = "company")] company: Option<String>,
    #[arg(long = "location")] location: Option<String>,
    /// Substring of the visitor IP
    #[arg(long = "ip")] ip: Option<String>,
    /// Substring of the visited page URL
    #[arg(long = "url")] url: Option<String>,
    /// Inclusive lower bound: YYYY-MM-DD or RFC 3339
    #[arg(long = "start")] start: Option<String>,
    /// Inclusive upper bound: YYYY-MM-DD (whole day) or RFC 3339
    #[arg(long = "end")] end: Option<String>,

    #[arg(long = "window-days", default_value_t = 14)] window_days: usize,
    #[arg(long = "max-series", default_value_t = 5)] max_series: usize,
    #[arg(long = "top", default_value_t = 5)] top: usize,
    /// Ranking metric: count | total | average
    #[arg(long = "rank-by", default_value = "count")] rank_by: String,
    /// Grouping field for trend and ranking: company | location | industry | url | referrer | traffic-source
    #[arg(long = "group-by", default_value = "company")] group_by: String,
    #[arg(long = "recent", default_value_t = 10)] recent: usize,
    #[arg(long = "details", default_value_t = 50)] details: usize,
    /// Last day of the trend window (defaults to today, UTC)
    #[arg(long = "today")] today: Option<String>,

    /// Print only one view: summary | trend | top | recent | visitors | facets
    #[arg(long = "only")] only: Option<String>,
    /// Output format: json | table
    #[arg(long = "format", default_value = "json")] format: String,
    /// Drop malformed records with a warning instead of failing
    #[arg(long = "lenient", default_value_t = false)] lenient: bool,
    /// Compute views on the calling thread only
    #[arg(long = "sequential", default_value_t = false)] sequential: bool,
}

impl Cli {
    fn criteria(&self) -> anyhow::Result<FilterCriteria> {
        let mut c = FilterCriteria::new().search(&self.search);
        if let Some(name) = self.company.as_deref() { c = c.company(name); }
        if let Some(name) = self.location.as_deref() { c = c.location(name); }
        if let Some(needle) = self.ip.as_deref() { c = c.ip(needle); }
        if let Some(needle) = self.url.as_deref() { c = c.url(needle); }
        if let Some(s) = self.start.as_deref() { c.start = DateBound::parse(s)?; }
        if let Some(s) = self.end.as_deref() { c.end = DateBound::parse(s)?; }
        Ok(c)
    }

    fn opts(&self) -> anyhow::Result<DashboardOpts> {
        let key: GroupKey = self.group_by.parse()?;
        let rank_by: RankBy = self.rank_by.parse()?;
        Ok(DashboardOpts {
            window_days: self.window_days,
            max_series: self.max_series,
            top_k: self.top,
            rank_by,
            recent_n: self.recent,
            detail_limit: self.details,
            trend_key: key,
            ranking_key: key,
            parallel: !self.sequential,
        })
    }

    fn today(&self) -> anyhow::Result<NaiveDate> {
        match self.today.as_deref() {
            Some(s) => timestamp::parse_day(s).with_context(|| format!("invalid --today '{s}', expected YYYY-MM-DD")),
            None => Ok(Utc::now().date_naive()),
        }
    }
}

fn load_raw(input: Option<&str>) -> anyhow::Result<Vec<RawRecord>> {
    match input {
        None | Some("-") => load_from_reader(io::stdin().lock()).context("loading visitor log from stdin"),
        Some(path) => JsonFileSource::new(path)
            .load_all()
            .with_context(|| format!("loading visitor log from {path}")),
    }
}

fn wants_table(format: &str) -> anyhow::Result<bool> {
    match format {
        "json" => Ok(false),
        "table" => Ok(true),
        other => anyhow::bail!("unknown format '{other}' (expected json | table)"),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    init_parallelism();
    let cli = Cli::parse();

    let table = wants_table(&cli.format)?;
    let criteria = cli.criteria()?;
    let opts = cli.opts()?;
    let today = cli.today()?;

    let raw = load_raw(cli.input.as_deref())?;
    let events = if cli.lenient {
        let (events, errors) = normalize::normalize_lenient(&raw);
        if !errors.is_empty() {
            warn!(dropped = errors.len(), kept = events.len(), "malformed records dropped");
        }
        events
    } else {
        normalize::normalize(&raw)?
    };

    let out = build_dashboard(&events, &criteria, &opts, today);

    match cli.only.as_deref() {
        Some("summary") => {
            if table { print_overview(&out) } else { println!("{}", serde_json::to_string_pretty(&out.overview)?) }
        }
        Some("trend") => {
            if table { print_trend(&out) } else { println!("{}", serde_json::to_string_pretty(&out.trend)?) }
        }
        Some("top") => {
            if table { print_top(&out, &cli.group_by) } else { println!("{}", serde_json::to_string_pretty(&out.top)?) }
        }
        Some("recent") => {
            if table { print_events(&out.recent) } else { println!("{}", serde_json::to_string_pretty(&out.recent)?) }
        }
        Some("visitors") => {
            if table { print_events(&out.details) } else { println!("{}", serde_json::to_string_pretty(&out.details)?) }
        }
        Some("facets") => {
            if table { print_facets(&out) } else { println!("{}", serde_json::to_string_pretty(&out.facets)?) }
        }
        Some(other) => anyhow::bail!("unknown view '{other}' (expected summary | trend | top | recent | visitors | facets)"),
        None => {
            if table {
                print_overview(&out);
                println!();
                print_trend(&out);
                println!();
                print_top(&out, &cli.group_by);
                println!();
                print_events(&out.recent);
            } else {
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
        }
    }
    Ok(())
}

fn print_overview(out: &DashboardOut) {
    println!("{:<18} {}", "Total Visits", out.overview.total_visits);
    println!("{:<18} {} sec", "Avg Time on Site", out.overview.average_time_on_page.round() as i64);
    println!("{:<18} {}", "Unique Companies", out.overview.unique_companies);
}

fn print_trend(out: &DashboardOut) {
    print!("{:<12}", "Day");
    for s in &out.trend.series { print!(" {:>12}", truncate(&s.key, 12)); }
    println!(" {:>8}", "All");
    for (i, day) in out.trend.labels.iter().enumerate() {
        print!("{:<12}", day.format("%Y-%m-%d").to_string());
        for s in &out.trend.series { print!(" {:>12}", s.counts[i]); }
        let all = out.daily_visits.get(i).map(|d| d.count).unwrap_or(0);
        println!(" {:>8}", all);
    }
}

fn print_top(out: &DashboardOut, group_by: &str) {
    println!("{:<30} {:<8} {:<12} {}", group_by, "Visits", "Total sec", "Avg sec");
    for g in &out.top {
        println!("{:<30} {:<8} {:<12.0} {:.1}", truncate(&g.key, 30), g.count, g.total, g.average);
    }
}

fn print_facets(out: &DashboardOut) {
    println!("Companies ({})", out.facets.companies.len());
    for c in &out.facets.companies { println!("  {c}"); }
    println!("Locations ({})", out.facets.locations.len());
    for l in &out.facets.locations { println!("  {l}"); }
}

fn print_events(events: &[VisitorEvent]) {
    println!(
        "{:<24} {:<16} {:<20} {:<24} {:<8} {:<6} {:<24} {}",
        "Company", "Industry", "Location", "Page", "Time", "Pages", "Referrer", "Visited"
    );
    for e in events { println!("{}", event_row(e)); }
}

fn event_row(e: &VisitorEvent) -> String {
    format!(
        "{:<24} {:<16} {:<20} {:<24} {:<8} {:<6} {:<24} {}",
        truncate(e.company.as_str(), 24),
        truncate(e.industry.as_str(), 16),
        truncate(e.location.as_str(), 20),
        truncate(e.url.as_str(), 24),
        e.time_on_page.map(|t| format!("{t:.0}s")).unwrap_or_else(|| "-".into()),
        e.pages_viewed.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
        truncate(e.referrer.as_str(), 24),
        e.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}
