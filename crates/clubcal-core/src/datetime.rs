use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  Weekday
};
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

/// Canonical `YYYY-MM-DD` identity of a
/// calendar day.
///
/// Every bucketing and equality check in
/// the calendar goes through this type; two
/// dates are the same day iff their keys
/// are equal. A `DateKey` can only be built
/// from a real calendar date, so a
/// malformed event date is rejected when it
/// is parsed rather than silently hidden.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize
)]
#[serde(
  try_from = "String",
  into = "String"
)]
pub struct DateKey(NaiveDate);

impl DateKey {
  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    parse_date_key(raw)
  }

  #[must_use]
  pub fn date(&self) -> NaiveDate {
    self.0
  }
}

impl From<NaiveDate> for DateKey {
  fn from(date: NaiveDate) -> Self {
    Self(date)
  }
}

impl fmt::Display for DateKey {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    let year = self.0.year();
    if year < 0 {
      write!(f, "-{:04}", -year)?;
    } else {
      write!(f, "{year:04}")?;
    }
    write!(
      f,
      "-{:02}-{:02}",
      self.0.month(),
      self.0.day()
    )
  }
}

impl FromStr for DateKey {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    parse_date_key(s)
  }
}

impl TryFrom<String> for DateKey {
  type Error = anyhow::Error;

  fn try_from(
    value: String
  ) -> Result<Self, Self::Error> {
    parse_date_key(&value)
  }
}

impl From<DateKey> for String {
  fn from(key: DateKey) -> Self {
    key.to_string()
  }
}

#[must_use]
pub fn to_date_key(
  date: NaiveDate
) -> DateKey {
  DateKey(date)
}

fn date_key_regex()
-> anyhow::Result<&'static Regex> {
  static DATE_KEY_RE: OnceLock<
    Result<Regex, regex::Error>
  > = OnceLock::new();
  DATE_KEY_RE
    .get_or_init(|| {
      Regex::new(
        r"^(?P<year>-?\d{4,})-(?P<month>\d{2})-(?P<day>\d{2})$"
      )
    })
    .as_ref()
    .map_err(|e| {
      anyhow!(
        "internal regex compile failure: \
         {e}"
      )
    })
}

/// Parses a strict zero-padded
/// `YYYY-MM-DD` key.
///
/// Only the canonical spelling of a date
/// is accepted: the input must be exactly
/// what `to_date_key` would print for it.
pub fn parse_date_key(
  raw: &str
) -> anyhow::Result<DateKey> {
  let caps = date_key_regex()?
    .captures(raw)
    .ok_or_else(|| {
      anyhow!(
        "invalid date key {raw:?}: \
         expected YYYY-MM-DD"
      )
    })?;

  let year: i32 = caps["year"]
    .parse()
    .with_context(|| {
      format!(
        "invalid year in date key \
         {raw:?}"
      )
    })?;
  let month: u32 = caps["month"]
    .parse()
    .with_context(|| {
      format!(
        "invalid month in date key \
         {raw:?}"
      )
    })?;
  let day: u32 = caps["day"]
    .parse()
    .with_context(|| {
      format!(
        "invalid day in date key {raw:?}"
      )
    })?;

  let key = NaiveDate::from_ymd_opt(
    year, month, day
  )
  .map(DateKey)
  .ok_or_else(|| {
    anyhow!(
      "date key {raw:?} is not a real \
       calendar date"
    )
  })?;

  if key.to_string() != raw {
    return Err(anyhow!(
      "date key {raw:?} is not \
       canonical; expected {key}"
    ));
  }
  Ok(key)
}

/// Current wall-clock date in the local
/// timezone.
#[must_use]
pub fn local_today() -> NaiveDate {
  Local::now().date_naive()
}

#[must_use]
pub fn is_today(
  date: NaiveDate,
  today: NaiveDate
) -> bool {
  to_date_key(date) == to_date_key(today)
}

#[must_use]
pub fn is_today_local(
  date: NaiveDate
) -> bool {
  is_today(date, local_today())
}

/// Month component only. The year is not
/// compared, so December of two different
/// years counts as the same month.
#[must_use]
pub fn is_same_month(
  a: NaiveDate,
  b: NaiveDate
) -> bool {
  a.month() == b.month()
}

/// The Monday on or before `day`.
#[must_use]
pub fn start_of_week(
  day: NaiveDate
) -> NaiveDate {
  start_of_week_from(day, Weekday::Mon)
}

#[must_use]
pub fn start_of_week_from(
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

/// First column of week and month grids.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize
)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
  #[default]
  Monday,
  Sunday
}

impl WeekStart {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Monday => "monday",
      | Self::Sunday => "sunday"
    }
  }

  #[must_use]
  pub fn weekday(self) -> Weekday {
    match self {
      | Self::Monday => Weekday::Mon,
      | Self::Sunday => Weekday::Sun
    }
  }
}

impl fmt::Display for WeekStart {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for WeekStart {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "monday" => Ok(Self::Monday),
      | "sunday" => Ok(Self::Sunday),
      | _ => {
        Err(anyhow!(
          "unknown week start: {s} \
           (expected monday or sunday)"
        ))
      }
    }
  }
}

#[must_use]
pub fn weekday_labels(
  week_start: Weekday
) -> [&'static str; 7] {
  match week_start {
    | Weekday::Sun => {
      [
        "Sun", "Mon", "Tue", "Wed",
        "Thu", "Fri", "Sat"
      ]
    }
    | _ => {
      [
        "Mon", "Tue", "Wed", "Thu",
        "Fri", "Sat", "Sun"
      ]
    }
  }
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  match NaiveDate::from_ymd_opt(
    next_year, next_month, 1
  ) {
    | Some(next_first) => {
      add_days(next_first, -1)
    }
    // December of the last representable year.
    | None => {
      NaiveDate::from_ymd_opt(
        year, month, 31
      )
      .unwrap_or(NaiveDate::MAX)
    }
  }
}

#[must_use]
pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

/// Saturates at chrono's representable
/// range instead of panicking.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .unwrap_or(date)
}

/// Moves by whole months, clamping the day
/// to the length of the target month
/// (Jan 31 + 1 month is Feb 28/29).
#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  shift_months_to_day(
    date,
    months,
    date.day()
  )
}

/// Like [`shift_months`] but aims for
/// `preferred_day` instead of the day of
/// `date`, so a navigator can remember the
/// day it was clamped away from.
#[must_use]
pub fn shift_months_to_day(
  date: NaiveDate,
  months: i32,
  preferred_day: u32
) -> NaiveDate {
  let total = i64::from(date.year())
    * 12
    + i64::from(date.month0())
    + i64::from(months);
  let Ok(year) =
    i32::try_from(total.div_euclid(12))
  else {
    return date;
  };
  let month =
    total.rem_euclid(12) as u32 + 1;

  let day = preferred_day
    .clamp(1, days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

#[must_use]
pub fn shift_years(
  date: NaiveDate,
  years: i32
) -> NaiveDate {
  shift_years_to_day(
    date,
    years,
    date.day()
  )
}

#[must_use]
pub fn shift_years_to_day(
  date: NaiveDate,
  years: i32,
  preferred_day: u32
) -> NaiveDate {
  let year =
    date.year().saturating_add(years);
  let month = date.month();
  let day = preferred_day
    .clamp(1, days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}
