use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};

use crate::datetime::{
  add_days,
  first_day_of_month,
  is_same_month,
  last_day_of_month,
  start_of_week_from
};

/// Six rows of seven days, whatever the
/// month needs.
pub const MONTH_GRID_CELLS: usize = 42;
pub const WEEK_GRID_CELLS: usize = 7;

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
pub enum ViewMode {
  Day,
  Week,
  #[default]
  Month,
  Year
}

impl ViewMode {
  pub fn all() -> [Self; 4] {
    [
      Self::Day,
      Self::Week,
      Self::Month,
      Self::Year
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month",
      | Self::Year => "year"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Day => "Day",
      | Self::Week => "Week",
      | Self::Month => "Month",
      | Self::Year => "Year"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key {
      | "day" => Some(Self::Day),
      | "week" => Some(Self::Week),
      | "month" => Some(Self::Month),
      | "year" => Some(Self::Year),
      | _ => None
    }
  }
}

impl fmt::Display for ViewMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for ViewMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(
      s.trim()
        .to_ascii_lowercase()
        .as_str()
    )
    .ok_or_else(|| {
      anyhow!(
        "unknown view: {s} (expected \
         day, week, month or year)"
      )
    })
  }
}

/// One block of consecutive dates.
///
/// `reference` is the first day of the
/// month the block belongs to in month and
/// year views; cells outside that month are
/// muted. Day and week blocks have no
/// reference and never mute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
  pub reference: Option<NaiveDate>,
  pub dates:     Vec<NaiveDate>
}

impl Grid {
  #[must_use]
  pub fn is_muted(
    &self,
    date: NaiveDate
  ) -> bool {
    self.reference.is_some_and(
      |reference| {
        !is_same_month(date, reference)
      }
    )
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.dates.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  /// "March 2024" for month blocks.
  #[must_use]
  pub fn title(&self) -> Option<String> {
    self.reference.map(|reference| {
      reference
        .format("%B %Y")
        .to_string()
    })
  }
}

fn consecutive(
  start: NaiveDate,
  count: usize
) -> Vec<NaiveDate> {
  (0..count as i64)
    .map(|offset| add_days(start, offset))
    .collect()
}

#[must_use]
pub fn month_grid(
  year: i32,
  month: u32,
  week_start: Weekday
) -> Grid {
  let first =
    first_day_of_month(year, month);
  let grid_start =
    start_of_week_from(first, week_start);
  Grid {
    reference: Some(first),
    dates:     consecutive(
      grid_start,
      MONTH_GRID_CELLS
    )
  }
}

#[must_use]
pub fn week_grid(
  cursor: NaiveDate,
  week_start: Weekday
) -> Grid {
  Grid {
    reference: None,
    dates:     consecutive(
      start_of_week_from(
        cursor, week_start
      ),
      WEEK_GRID_CELLS
    )
  }
}

#[must_use]
pub fn day_grid(
  cursor: NaiveDate
) -> Grid {
  Grid {
    reference: None,
    dates:     vec![cursor]
  }
}

/// Twelve independent month grids, each
/// muted against its own month.
#[must_use]
pub fn year_grids(
  year: i32,
  week_start: Weekday
) -> Vec<Grid> {
  (1_u32..=12_u32)
    .map(|month| {
      month_grid(year, month, week_start)
    })
    .collect()
}

#[tracing::instrument(level = "debug")]
pub fn build_grids(
  view: ViewMode,
  cursor: NaiveDate,
  week_start: Weekday
) -> Vec<Grid> {
  let grids = match view {
    | ViewMode::Day => {
      vec![day_grid(cursor)]
    }
    | ViewMode::Week => {
      vec![week_grid(cursor, week_start)]
    }
    | ViewMode::Month => {
      vec![month_grid(
        cursor.year(),
        cursor.month(),
        week_start
      )]
    }
    | ViewMode::Year => {
      year_grids(
        cursor.year(),
        week_start
      )
    }
  };

  tracing::debug!(
    view = view.as_key(),
    grids = grids.len(),
    cells = grids
      .iter()
      .map(Grid::len)
      .sum::<usize>(),
    "built calendar grids"
  );
  grids
}

/// First and last date of the period the
/// view is showing, ignoring padding cells.
#[must_use]
pub fn period_window(
  view: ViewMode,
  cursor: NaiveDate,
  week_start: Weekday
) -> (NaiveDate, NaiveDate) {
  match view {
    | ViewMode::Year => {
      (
        first_day_of_month(
          cursor.year(),
          1
        ),
        last_day_of_month(
          cursor.year(),
          12
        )
      )
    }
    | ViewMode::Month => {
      (
        first_day_of_month(
          cursor.year(),
          cursor.month()
        ),
        last_day_of_month(
          cursor.year(),
          cursor.month()
        )
      )
    }
    | ViewMode::Week => {
      let start = start_of_week_from(
        cursor, week_start
      );
      (start, add_days(start, 6))
    }
    | ViewMode::Day => (cursor, cursor)
  }
}

#[must_use]
pub fn period_title(
  view: ViewMode,
  cursor: NaiveDate,
  week_start: Weekday
) -> String {
  match view {
    | ViewMode::Year => {
      cursor.year().to_string()
    }
    | ViewMode::Month => {
      cursor.format("%B %Y").to_string()
    }
    | ViewMode::Week => {
      let (start, end) = period_window(
        view, cursor, week_start
      );
      format!(
        "{} – {}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
      )
    }
    | ViewMode::Day => {
      cursor
        .format("%A, %Y-%m-%d")
        .to_string()
    }
  }
}
