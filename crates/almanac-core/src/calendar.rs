use std::fmt::Display;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Months,
  NaiveDate,
  NaiveTime,
  TimeDelta,
  Weekday
};
use regex::Regex;

use crate::event::Event;

pub const DEFAULT_FILL_WIDTH: usize = 2;

const DAYS_PER_WEEK: usize = 7;

#[must_use]
pub fn is_leap_year(year: i64) -> bool {
  year % 4 == 0
    && (year % 100 != 0
      || year % 400 == 0)
}

/// Day count of `month` (1-indexed) in
/// `year`. Months outside `1..=12` roll
/// over into neighbouring years, so
/// month 13 is January of the next year
/// and month 0 is December of the
/// previous one.
#[must_use]
pub fn days_in_month(
  year: i32,
  month: i32
) -> u32 {
  let index = i64::from(year) * 12
    + i64::from(month)
    - 1;
  let year = index.div_euclid(12);
  let month = index.rem_euclid(12) + 1;

  match month {
    | 1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
    | 4 | 6 | 9 | 11 => 30,
    | _ => {
      if is_leap_year(year) {
        29
      } else {
        28
      }
    }
  }
}

#[must_use]
pub fn first_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

#[must_use]
pub fn last_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  let last = days_in_month(
    date.year(),
    date.month() as i32
  );
  date.with_day(last).unwrap_or(date)
}

/// `None` when the result falls outside
/// the representable date range.
#[must_use]
pub fn checked_add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  TimeDelta::try_days(days).and_then(
    |delta| {
      date.checked_add_signed(delta)
    }
  )
}

/// Saturates at `NaiveDate::MIN` /
/// `NaiveDate::MAX`.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  checked_add_days(date, days)
    .unwrap_or(if days < 0 {
      NaiveDate::MIN
    } else {
      NaiveDate::MAX
    })
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

/// Moves `date` by whole months,
/// clamping the day to the length of
/// the target month.
#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let index = i64::from(date.year()) * 12
    + i64::from(date.month0())
    + i64::from(months);
  let Ok(year) =
    i32::try_from(index.div_euclid(12))
  else {
    return date;
  };
  let month =
    index.rem_euclid(12) as i32 + 1;

  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year,
    month as u32,
    day
  )
  .unwrap_or(date)
}

/// The Sunday-to-Saturday week
/// containing `date`.
#[must_use]
pub fn week_dates(
  date: NaiveDate
) -> [NaiveDate; DAYS_PER_WEEK] {
  let sunday =
    start_of_week(date, Weekday::Sun);
  std::array::from_fn(|offset| {
    add_days(sunday, offset as i64)
  })
}

/// Month grid for the month of `date`:
/// Sunday-first rows of day numbers,
/// padded with `None` before the 1st and
/// after the last day.
#[must_use]
pub fn weeks_in_month(
  date: NaiveDate
) -> Vec<[Option<u32>; DAYS_PER_WEEK]>
{
  let first = first_day_of_month(date);
  let total = days_in_month(
    date.year(),
    date.month() as i32
  );

  let mut weeks = Vec::new();
  let mut week = [None; DAYS_PER_WEEK];
  let mut slot = first
    .weekday()
    .num_days_from_sunday()
    as usize;

  for day in 1..=total {
    week[slot] = Some(day);
    slot += 1;
    if slot == DAYS_PER_WEEK {
      weeks.push(week);
      week = [None; DAYS_PER_WEEK];
      slot = 0;
    }
  }

  if slot > 0 {
    weeks.push(week);
  }

  weeks
}

/// Week-of-month label. A week belongs
/// to the month holding its Thursday,
/// so the first days of a month can
/// report the last week of the previous
/// one.
#[must_use]
pub fn format_week(
  date: NaiveDate
) -> String {
  let to_thursday = 4 - date
    .weekday()
    .num_days_from_sunday()
    as i64;
  let thursday =
    add_days(date, to_thursday);

  let first =
    first_day_of_month(thursday);
  let to_first_thursday = (4 + 7
    - first
      .weekday()
      .num_days_from_sunday()
      as i64)
    % 7;
  let first_thursday =
    add_days(first, to_first_thursday);

  let week_number = (thursday
    - first_thursday)
    .num_days()
    / 7
    + 1;

  format!(
    "{}년 {}월 {}주",
    thursday.year(),
    thursday.month(),
    week_number
  )
}

#[must_use]
pub fn format_month(
  date: NaiveDate
) -> String {
  format!(
    "{}년 {}월",
    date.year(),
    date.month()
  )
}

/// Inclusive on both ends; an inverted
/// range contains nothing.
#[must_use]
pub fn is_date_in_range(
  date: NaiveDate,
  start: NaiveDate,
  end: NaiveDate
) -> bool {
  date >= start && date <= end
}

/// Left-pads the textual form of
/// `value` with zeros up to `size`
/// characters. Longer values are
/// returned unchanged.
#[must_use]
pub fn fill_zero<T: Display>(
  value: T,
  size: usize
) -> String {
  format!(
    "{:0>size$}",
    value.to_string()
  )
}

#[must_use]
pub fn zero_pad<T: Display>(
  value: T
) -> String {
  fill_zero(value, DEFAULT_FILL_WIDTH)
}

#[must_use]
pub fn format_date(
  date: NaiveDate,
  day: Option<u32>
) -> String {
  format!(
    "{}-{}-{}",
    date.year(),
    zero_pad(date.month()),
    zero_pad(day.unwrap_or(date.day()))
  )
}

#[must_use]
pub fn events_on_day(
  events: &[Event],
  day: i32
) -> Vec<&Event> {
  if !(1..=31).contains(&day) {
    return Vec::new();
  }

  events
    .iter()
    .filter(|event| {
      event.date.day() as i32 == day
    })
    .collect()
}

pub fn parse_event_date(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "invalid date (expected \
       YYYY-MM-DD): {raw}"
    )
  })
}

pub fn parse_wall_clock(
  raw: &str
) -> anyhow::Result<NaiveTime> {
  let trimmed = raw.trim();
  NaiveTime::parse_from_str(
    trimmed, "%H:%M:%S"
  )
  .or_else(|_| {
    NaiveTime::parse_from_str(
      trimmed, "%H:%M"
    )
  })
  .with_context(|| {
    format!(
      "invalid time (expected HH:MM \
       or HH:MM:SS): {raw}"
    )
  })
}

#[must_use]
pub fn format_wall_clock(
  time: NaiveTime
) -> String {
  use chrono::Timelike;

  if time.second() == 0 {
    time.format("%H:%M").to_string()
  } else {
    time.format("%H:%M:%S").to_string()
  }
}

/// Resolves a user-facing date
/// expression against `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  let rel_re = relative_date_regex()?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "relative amount out of range"
      )?;
    let num =
      if negative { -num } else { num };

    let shifted = match caps
      .name("unit")
      .map(|m| m.as_str())
    {
      | Some("d") => {
        checked_add_days(today, num)
      }
      | Some("w") => {
        num.checked_mul(7).and_then(
          |days| {
            checked_add_days(today, days)
          }
        )
      }
      | Some("m") => {
        let months = u32::try_from(
          num.unsigned_abs()
        )
        .ok()
        .map(Months::new);
        months.and_then(|months| {
          if negative {
            today
              .checked_sub_months(months)
          } else {
            today
              .checked_add_months(months)
          }
        })
      }
      | _ => {
        return Err(anyhow!(
          "unsupported relative unit \
           in {token}"
        ));
      }
    };

    return shifted.ok_or_else(|| {
      anyhow!(
        "date offset out of range: \
         {token}"
      )
    });
  }

  parse_event_date(token)
}

fn relative_date_regex()
-> anyhow::Result<&'static Regex> {
  static RELATIVE_DATE: OnceLock<
    Result<Regex, regex::Error>
  > = OnceLock::new();
  RELATIVE_DATE
    .get_or_init(|| {
      Regex::new(
        r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$"
      )
    })
    .as_ref()
    .map_err(|e| {
      anyhow!(
        "internal regex compile \
         failure: {e}"
      )
    })
}

pub mod event_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &NaiveDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &date.format("%Y-%m-%d").to_string()
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_event_date(&raw)
      .map_err(serde::de::Error::custom)
  }

  pub mod option {
    use chrono::NaiveDate;
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      date: &Option<NaiveDate>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match date {
        | Some(value) => {
          super::serialize(
            value, serializer
          )
        }
        | None => {
          serializer.serialize_none()
        }
      }
    }

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<
      Option<NaiveDate>,
      D::Error
    >
    where
      D: Deserializer<'de>
    {
      let opt =
        Option::<String>::deserialize(
          deserializer
        )?;
      match opt {
        | Some(raw) if !raw.trim().is_empty() => {
          super::super::parse_event_date(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
        }
        | _ => Ok(None)
      }
    }
  }
}

pub mod wall_clock_serde {
  use chrono::NaiveTime;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    time: &NaiveTime,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &super::format_wall_clock(*time)
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveTime, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_wall_clock(&raw)
      .map_err(serde::de::Error::custom)
  }
}
