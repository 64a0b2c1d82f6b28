use chrono::{TimeZone, Utc};
use visitorscope::normalize::{normalize, normalize_lenient, normalize_record};
use visitorscope::record::{Category, RawRecord};
use visitorscope::source::parse_records;

fn raw(json: &str) -> RawRecord {
    serde_json::from_str(json).expect("raw record")
}

#[test]
fn keeps_present_fields_and_substitutes_unknown() {
    let r = raw(r#"{"ip":"8.8.8.8","company":"Google LLC","location":"","url":"/pricing","timestamp":"2024-03-01T10:00:00Z","timeOnPage":120,"pagesViewed":3}"#);
    let e = normalize_record(&r, 0).unwrap();
    assert_eq!(e.ip, "8.8.8.8");
    assert_eq!(e.company, Category::Known("Google LLC".into()));
    assert_eq!(e.location, Category::Unknown);
    assert_eq!(e.location.as_str(), "Unknown");
    assert_eq!(e.industry, Category::Unknown);
    assert_eq!(e.url.as_str(), "/pricing");
    assert_eq!(e.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
    assert_eq!(e.time_on_page, Some(120.0));
    assert_eq!(e.pages_viewed, Some(3));
}

#[test]
fn absent_companies_share_the_placeholder() {
    let a = normalize_record(&raw(r#"{"ip":"1.1.1.1","timestamp":"2024-03-01T10:00:00Z"}"#), 0).unwrap();
    let b = normalize_record(&raw(r#"{"ip":"1.1.1.2","company":"   ","timestamp":"2024-03-01T11:00:00Z"}"#), 1).unwrap();
    assert_eq!(a.company, b.company);
    assert!(!a.company.is_known());
}

#[test]
fn ignores_unknown_fields() {
    let r = raw(r#"{"ip":"1.1.1.1","timestamp":"2024-03-01T10:00:00Z","userAgent":"Mozilla/5.0","trafficSource":"Paid","visitCount":4,"someFutureField":{"x":1}}"#);
    let e = normalize_record(&r, 0).unwrap();
    assert_eq!(e.traffic_source.as_str(), "Paid");
    assert_eq!(e.visit_count, Some(4));
    assert_eq!(e.user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[test]
fn reports_index_of_unparseable_timestamp() {
    let recs = parse_records(
        r#"[
        {"ip":"a","timestamp":"2024-03-01T10:00:00Z"},
        {"ip":"b","timestamp":"not a date"},
        {"ip":"c","timestamp":"2024-03-02T10:00:00Z"}
    ]"#,
    )
    .unwrap();
    let err = normalize(&recs).unwrap_err();
    assert_eq!(err.index, 1);
    assert!(err.reason.contains("timestamp"));
}

#[test]
fn missing_timestamp_is_malformed() {
    let err = normalize_record(&raw(r#"{"ip":"a"}"#), 7).unwrap_err();
    assert_eq!(err.index, 7);
    let err = normalize_record(&raw(r#"{"ip":"a","timestamp":null}"#), 2).unwrap_err();
    assert_eq!(err.index, 2);
}

#[test]
fn negative_time_on_page_is_malformed() {
    let err = normalize_record(&raw(r#"{"ip":"a","timestamp":"2024-03-01T10:00:00Z","timeOnPage":-5}"#), 0).unwrap_err();
    assert!(err.reason.contains("timeOnPage"));
}

#[test]
fn lenient_mode_collects_every_error() {
    let recs = parse_records(
        r#"[
        {"ip":"a","timestamp":"bad"},
        {"ip":"b","timestamp":"2024-03-01T10:00:00Z"},
        {"ip":"c"}
    ]"#,
    )
    .unwrap();
    let (events, errors) = normalize_lenient(&recs);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].ip, "b");
    let idx: Vec<usize> = errors.iter().map(|e| e.index).collect();
    assert_eq!(idx, vec![0, 2]);
}

#[test]
fn empty_input_normalizes_to_empty() {
    assert!(normalize(&[]).unwrap().is_empty());
}

#[test]
fn coerces_numeric_text_and_whole_floats() {
    let r = raw(r#"{"ip":"a","company":42,"timestamp":"2024-03-01T10:00:00Z","timeOnPage":"45","pagesViewed":2.0,"visitCount":" 3 "}"#);
    let e = normalize_record(&r, 0).unwrap();
    assert_eq!(e.company.as_str(), "42");
    assert_eq!(e.time_on_page, Some(45.0));
    assert_eq!(e.pages_viewed, Some(2));
    assert_eq!(e.visit_count, Some(3));

    let blank = normalize_record(&raw(r#"{"ip":"a","timestamp":"2024-03-01T10:00:00Z","timeOnPage":""}"#), 0).unwrap();
    assert_eq!(blank.time_on_page, None);
}

#[test]
fn lenient_mode_drops_only_mistyped_records() {
    let recs = parse_records(
        r#"[
        {"ip":"a","timestamp":"2024-03-01T10:00:00Z"},
        {"ip":"b","timestamp":"2024-03-01T11:00:00Z","timeOnPage":"45"},
        {"ip":"c","timestamp":"2024-03-01T12:00:00Z","pagesViewed":2.0},
        {"ip":"d","timestamp":"2024-03-01T13:00:00Z","timeOnPage":"slow"},
        {"ip":"e","timestamp":"2024-03-01T14:00:00Z","pagesViewed":2.5},
        {"ip":"f","timestamp":"2024-03-01T15:00:00Z","company":{"name":"Acme"}}
    ]"#,
    )
    .unwrap();

    let err = normalize(&recs).unwrap_err();
    assert_eq!(err.index, 3);
    assert!(err.reason.contains("timeOnPage"));

    let (events, errors) = normalize_lenient(&recs);
    let kept: Vec<&str> = events.iter().map(|e| e.ip.as_str()).collect();
    assert_eq!(kept, vec!["a", "b", "c"]);
    assert_eq!(events[1].time_on_page, Some(45.0));
    assert_eq!(events[2].pages_viewed, Some(2));
    let idx: Vec<usize> = errors.iter().map(|e| e.index).collect();
    assert_eq!(idx, vec![3, 4, 5]);
    assert!(errors[1].reason.contains("pagesViewed"));
    assert!(errors[2].reason.contains("company"));
}
