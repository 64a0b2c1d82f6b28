use crate::record::VisitorEvent;

/// The `n` most recent events, newest first. Events sharing a timestamp keep
/// their input order.
pub fn recent(events: &[VisitorEvent], n: usize) -> Vec<VisitorEvent> {
    let mut refs: Vec<&VisitorEvent> = events.iter().collect();
    refs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    refs.into_iter().take(n).cloned().collect()
}
