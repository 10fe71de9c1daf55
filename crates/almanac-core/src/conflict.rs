//! Time-overlap detection between events.
//!
//! Two spans overlap when `a.start < b.end && b.start < a.end`, so an event
//! ending exactly when another starts is not a conflict.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, instrument};

use crate::event::Event;
use crate::recurrence::{horizon, occurrences};

pub const DEFAULT_CONFLICT_HORIZON_DAYS: i64 = 365;

/// Upper bound on a scan, one hundred years of days.
pub const MAX_CONFLICT_HORIZON_DAYS: i64 = 36_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl EventSpan {
    pub fn of_event(event: &Event) -> Self {
        Self::on_date(event, event.date)
    }

    pub fn on_date(event: &Event, date: NaiveDate) -> Self {
        Self {
            start: date.and_time(event.start_time),
            end: date.and_time(event.end_time),
        }
    }
}

pub fn is_overlapping(a: &EventSpan, b: &EventSpan) -> bool {
    a.start < b.end && b.start < a.end
}

fn overlap_minutes(a: &EventSpan, b: &EventSpan) -> i64 {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (end - start).num_minutes()
}

/// Events other than `candidate` whose own date and times overlap it.
/// Repeat rules are ignored here; see [`find_series_conflicts`].
pub fn find_overlapping_events<'a>(candidate: &Event, events: &'a [Event]) -> Vec<&'a Event> {
    let span = EventSpan::of_event(candidate);
    events
        .iter()
        .filter(|event| event.id != candidate.id)
        .filter(|event| is_overlapping(&span, &EventSpan::of_event(event)))
        .collect()
}

/// One clash between an occurrence of the candidate and an occurrence of
/// an existing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict<'a> {
    pub existing: &'a Event,
    pub date: NaiveDate,
    pub overlap_minutes: i64,
}

/// Expands the candidate and every other event over `horizon_days` days
/// (capped at [`MAX_CONFLICT_HORIZON_DAYS`]) from the candidate's first
/// date and reports each overlapping pair of occurrences, ordered by date
/// then input order.
#[instrument(skip(candidate, events), fields(id = %candidate.id, count = events.len()))]
pub fn find_series_conflicts<'a>(
    candidate: &Event,
    events: &'a [Event],
    horizon_days: i64,
) -> Vec<Conflict<'a>> {
    let (from, to) = horizon(candidate.date, horizon_days.min(MAX_CONFLICT_HORIZON_DAYS));
    let candidate_dates = occurrences(candidate, from, to);
    if candidate_dates.is_empty() {
        return Vec::new();
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<Conflict<'a>>> = BTreeMap::new();
    for existing in events.iter().filter(|event| event.id != candidate.id) {
        let existing_dates = occurrences(existing, from, to);
        for date in &candidate_dates {
            if existing_dates.binary_search(date).is_err() {
                continue;
            }
            let ours = EventSpan::on_date(candidate, *date);
            let theirs = EventSpan::on_date(existing, *date);
            if is_overlapping(&ours, &theirs) {
                by_date.entry(*date).or_default().push(Conflict {
                    existing,
                    date: *date,
                    overlap_minutes: overlap_minutes(&ours, &theirs),
                });
            }
        }
    }

    let conflicts: Vec<Conflict<'a>> = by_date.into_values().flatten().collect();
    debug!(conflicts = conflicts.len(), "series conflict scan finished");
    conflicts
}
