use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::trace;

use crate::calendar::{
  first_day_of_month,
  is_date_in_range,
  last_day_of_month,
  week_dates
};
use crate::event::Event;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default
)]
pub enum CalendarView {
  Week,
  #[default]
  Month
}

impl CalendarView {
  pub fn all() -> [Self; 2] {
    [Self::Week, Self::Month]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Week => "week",
      | Self::Month => "month"
    }
  }

  pub fn from_key(
    raw: &str
  ) -> Option<Self> {
    let lower =
      raw.trim().to_ascii_lowercase();
    Self::all()
      .into_iter()
      .find(|view| view.as_key() == lower)
  }

  /// Inclusive date window this view
  /// shows around `reference`.
  pub fn window(
    self,
    reference: NaiveDate
  ) -> (NaiveDate, NaiveDate) {
    match self {
      | Self::Week => {
        let week = week_dates(reference);
        (week[0], week[6])
      }
      | Self::Month => {
        (
          first_day_of_month(reference),
          last_day_of_month(reference)
        )
      }
    }
  }
}

impl fmt::Display for CalendarView {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for CalendarView {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(s).ok_or_else(|| {
      anyhow!(
        "unknown calendar view: {s} \
         (expected week or month)"
      )
    })
  }
}

/// Combined view-window and search
/// predicate.
#[derive(Debug, Clone)]
pub struct EventFilter {
  needle: String,
  view:   CalendarView,
  start:  NaiveDate,
  end:    NaiveDate
}

impl EventFilter {
  pub fn new(
    search_term: &str,
    reference: NaiveDate,
    view: CalendarView
  ) -> Self {
    let (start, end) =
      view.window(reference);
    Self {
      needle: search_term.to_lowercase(),
      view,
      start,
      end
    }
  }

  pub fn view(&self) -> CalendarView {
    self.view
  }

  pub fn window(
    &self
  ) -> (NaiveDate, NaiveDate) {
    (self.start, self.end)
  }

  pub fn matches_search(
    &self,
    event: &Event
  ) -> bool {
    if self.needle.is_empty() {
      return true;
    }

    [
      &event.title,
      &event.description,
      &event.location
    ]
    .into_iter()
    .any(|field| {
      field
        .to_lowercase()
        .contains(&self.needle)
    })
  }

  pub fn matches_window(
    &self,
    event: &Event
  ) -> bool {
    is_date_in_range(
      event.date, self.start, self.end
    )
  }

  pub fn matches(
    &self,
    event: &Event
  ) -> bool {
    self.matches_window(event)
      && self.matches_search(event)
  }
}

/// Events visible in `view` around
/// `reference` that match
/// `search_term`, in input order.
#[tracing::instrument(skip(events), fields(count = events.len()))]
pub fn filter_events<'a>(
  events: &'a [Event],
  search_term: &str,
  reference: NaiveDate,
  view: CalendarView
) -> Vec<&'a Event> {
  let filter = EventFilter::new(
    search_term,
    reference,
    view
  );

  let out: Vec<&Event> = events
    .iter()
    .filter(|event| filter.matches(event))
    .collect();

  trace!(
    matched = out.len(),
    "filtered events"
  );
  out
}
