//! Expansion of repeat rules into concrete occurrence dates.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::trace;

use crate::calendar::{add_days, checked_add_days};
use crate::event::{Event, RepeatType};

/// One dated instance of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence<'a> {
    pub event: &'a Event,
    pub date: NaiveDate,
}

impl Occurrence<'_> {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.event.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.event.end_time)
    }
}

/// Dates of `event` inside `[from, to]`, ascending.
///
/// Monthly and yearly series keep the day of month of the first
/// occurrence and skip periods that lack it (no Feb 30, no Feb 29 outside
/// leap years).
pub fn occurrences(event: &Event, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let last = match event.repeat.end_date {
        Some(end_date) if event.is_recurring() => to.min(end_date),
        _ => to,
    };
    if from > last || event.date > last {
        return Vec::new();
    }

    let step = i64::from(event.repeat.interval.max(1));
    let anchor = event.date;

    let out = match event.repeat.kind {
        RepeatType::None => {
            if anchor >= from {
                vec![anchor]
            } else {
                Vec::new()
            }
        }
        RepeatType::Daily => fixed_stride(anchor, step, from, last),
        RepeatType::Weekly => fixed_stride(anchor, step * 7, from, last),
        RepeatType::Monthly => calendar_stride(anchor, step, from, last, |n| {
            let index = i64::from(anchor.year()) * 12 + i64::from(anchor.month0()) + n;
            let year = i32::try_from(index.div_euclid(12)).ok()?;
            let month = u32::try_from(index.rem_euclid(12) + 1).ok()?;
            Some((year, month))
        }),
        RepeatType::Yearly => calendar_stride(anchor, step, from, last, |n| {
            let year = i32::try_from(i64::from(anchor.year()) + n).ok()?;
            Some((year, anchor.month()))
        }),
    };

    trace!(id = %event.id, count = out.len(), "expanded occurrences");
    out
}

fn fixed_stride(anchor: NaiveDate, stride: i64, from: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut n = if from > anchor {
        let gap = (from - anchor).num_days();
        (gap + stride - 1) / stride
    } else {
        0
    };

    let mut out = Vec::new();
    loop {
        let Some(date) = n
            .checked_mul(stride)
            .and_then(|days| checked_add_days(anchor, days))
        else {
            break;
        };
        if date > last {
            break;
        }
        out.push(date);
        n += 1;
    }
    out
}

/// Walks whole periods (months or years) from the anchor. `period` maps
/// an offset in periods to the target year and month.
fn calendar_stride<F>(
    anchor: NaiveDate,
    step: i64,
    from: NaiveDate,
    last: NaiveDate,
    period: F,
) -> Vec<NaiveDate>
where
    F: Fn(i64) -> Option<(i32, u32)>,
{
    let mut out = Vec::new();
    let mut n: i64 = 0;

    loop {
        let Some((year, month)) = n.checked_mul(step).and_then(&period) else {
            break;
        };
        let Some(period_start) = NaiveDate::from_ymd_opt(year, month, 1) else {
            break;
        };
        if period_start > last {
            break;
        }

        if let Some(date) = NaiveDate::from_ymd_opt(year, month, anchor.day())
            && date >= from
            && date <= last
        {
            out.push(date);
        }
        n += 1;
    }
    out
}

/// Every occurrence of every event inside `[from, to]`, grouped by event
/// in input order.
pub fn expand_events(events: &[Event], from: NaiveDate, to: NaiveDate) -> Vec<Occurrence<'_>> {
    events
        .iter()
        .flat_map(|event| {
            occurrences(event, from, to)
                .into_iter()
                .map(move |date| Occurrence { event, date })
        })
        .collect()
}

/// Window of `days` days starting at `start`, inclusive of both ends.
pub fn horizon(start: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (start, add_days(start, days.max(0)))
}
