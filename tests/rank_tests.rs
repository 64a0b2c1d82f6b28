use chrono::{TimeZone, Utc};
use visitorscope::rank::{top_k, top_k_by, RankBy};
use visitorscope::record::{GroupKey, Metric, VisitorEvent};
use visitorscope::stats::{group_stats, GroupStats, UnknownPolicy};

fn stats_for(pairs: &[(&str, f64)]) -> GroupStats {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let events: Vec<VisitorEvent> = pairs
        .iter()
        .map(|(c, secs)| VisitorEvent::new("ip", t).with_company(c).with_time_on_page(*secs))
        .collect();
    group_stats(&events, GroupKey::Company, Metric::TimeOnPage, UnknownPolicy::Skip)
}

fn keys(v: &[visitorscope::stats::GroupStat]) -> Vec<&str> {
    v.iter().map(|g| g.key.as_str()).collect()
}

#[test]
fn sorts_descending_by_chosen_metric() {
    let stats = stats_for(&[("A", 10.0), ("B", 100.0), ("B", 100.0), ("C", 500.0), ("A", 5.0), ("A", 1.0)]);
    assert_eq!(keys(&top_k(&stats, 3, RankBy::Count)), vec!["A", "B", "C"]);
    assert_eq!(keys(&top_k(&stats, 3, RankBy::Total)), vec!["C", "B", "A"]);
    assert_eq!(keys(&top_k(&stats, 3, RankBy::Average)), vec!["C", "B", "A"]);
}

#[test]
fn ties_keep_discovery_order() {
    let stats = stats_for(&[("Z", 1.0), ("M", 1.0), ("A", 1.0), ("M", 1.0)]);
    assert_eq!(keys(&top_k(&stats, 5, RankBy::Count)), vec!["M", "Z", "A"]);
    assert_eq!(keys(&top_k(&stats, 5, RankBy::Average)), vec!["Z", "M", "A"]);
}

#[test]
fn truncates_without_padding() {
    let stats = stats_for(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);
    for k in 0..6 {
        let top = top_k(&stats, k, RankBy::Total);
        assert_eq!(top.len(), k.min(stats.len()));
        assert!(top.windows(2).all(|w| w[0].total >= w[1].total));
    }
}

#[test]
fn empty_stats_rank_to_empty() {
    assert!(top_k(&GroupStats::default(), 5, RankBy::Count).is_empty());
}

#[test]
fn generic_ranking_over_plain_items() {
    let items = vec![("a", 3), ("b", 7), ("c", 3), ("d", 1)];
    let top = top_k_by(&items, 3, |(_, n)| *n as f64);
    assert_eq!(top, vec![("b", 7), ("a", 3), ("c", 3)]);
}

#[test]
fn parses_rank_names() {
    assert_eq!("count".parse::<RankBy>().unwrap(), RankBy::Count);
    assert_eq!("AVG".parse::<RankBy>().unwrap(), RankBy::Average);
    assert_eq!("total".parse::<RankBy>().unwrap(), RankBy::Total);
    assert!("median".parse::<RankBy>().is_err());
}
