use chrono::{
  Datelike,
  NaiveDate
};
use tracing::debug;

use crate::datetime::{
  DateKey,
  add_days,
  local_today,
  shift_months_to_day,
  shift_years_to_day
};
use crate::grid::ViewMode;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Direction {
  Prev,
  Next
}

impl Direction {
  pub fn delta(self) -> i32 {
    match self {
      | Direction::Prev => -1,
      | Direction::Next => 1
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum NavAction {
  Step(Direction),
  Today
}

impl NavAction {
  /// Keyboard bindings: arrows step,
  /// Home jumps to today.
  pub fn from_key_name(
    key: &str
  ) -> Option<Self> {
    match key {
      | "ArrowLeft" => {
        Some(Self::Step(Direction::Prev))
      }
      | "ArrowRight" => {
        Some(Self::Step(Direction::Next))
      }
      | "Home" => Some(Self::Today),
      | _ => None
    }
  }
}

/// Pure cursor step for one view.
///
/// Month and year steps clamp to the
/// target month length while aiming for
/// `preferred_day`.
#[must_use]
pub fn shift_cursor(
  cursor: NaiveDate,
  view: ViewMode,
  delta: i32,
  preferred_day: u32
) -> NaiveDate {
  match view {
    | ViewMode::Day => {
      add_days(cursor, i64::from(delta))
    }
    | ViewMode::Week => {
      add_days(
        cursor,
        i64::from(delta) * 7
      )
    }
    | ViewMode::Month => {
      shift_months_to_day(
        cursor,
        delta,
        preferred_day
      )
    }
    | ViewMode::Year => {
      shift_years_to_day(
        cursor,
        delta,
        preferred_day
      )
    }
  }
}

/// Cursor, view and selection for one
/// calendar screen.
///
/// `anchor_day` is the day of month the
/// user last landed on deliberately. Month
/// and year steps clamp to short months but
/// keep aiming for it, so Jan 31 -> Feb 29
/// -> Jan 31 round-trips. Selection is
/// independent of the cursor and survives
/// navigation until cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
  cursor:     NaiveDate,
  view:       ViewMode,
  selected:   Option<DateKey>,
  anchor_day: u32
}

impl Navigator {
  pub fn new(
    cursor: NaiveDate,
    view: ViewMode
  ) -> Self {
    Self {
      cursor,
      view,
      selected: None,
      anchor_day: cursor.day()
    }
  }

  pub fn cursor(&self) -> NaiveDate {
    self.cursor
  }

  pub fn view(&self) -> ViewMode {
    self.view
  }

  pub fn selected(
    &self
  ) -> Option<&DateKey> {
    self.selected.as_ref()
  }

  /// Switching views never moves the
  /// cursor.
  pub fn set_view(
    &mut self,
    view: ViewMode
  ) {
    debug!(
      from = self.view.as_key(),
      to = view.as_key(),
      "switching view"
    );
    self.view = view;
  }

  pub fn set_cursor(
    &mut self,
    cursor: NaiveDate
  ) {
    self.cursor = cursor;
    self.anchor_day = cursor.day();
  }

  pub fn navigate(
    &mut self,
    direction: Direction
  ) -> NaiveDate {
    let next = shift_cursor(
      self.cursor,
      self.view,
      direction.delta(),
      self.anchor_day
    );
    if matches!(
      self.view,
      ViewMode::Day | ViewMode::Week
    ) {
      self.anchor_day = next.day();
    }

    debug!(
      view = self.view.as_key(),
      ?direction,
      from = %self.cursor,
      to = %next,
      "navigated"
    );
    self.cursor = next;
    next
  }

  pub fn step(
    &mut self,
    direction: Direction,
    times: u32
  ) -> NaiveDate {
    for _ in 0..times {
      self.navigate(direction);
    }
    self.cursor
  }

  pub fn go_to_today(
    &mut self,
    today: NaiveDate
  ) -> NaiveDate {
    self.set_cursor(today);
    debug!(cursor = %today, "jumped to today");
    today
  }

  pub fn today(&mut self) -> NaiveDate {
    self.go_to_today(local_today())
  }

  pub fn apply(
    &mut self,
    action: NavAction,
    today: NaiveDate
  ) -> NaiveDate {
    match action {
      | NavAction::Step(direction) => {
        self.navigate(direction)
      }
      | NavAction::Today => {
        self.go_to_today(today)
      }
    }
  }

  pub fn select(
    &mut self,
    key: DateKey
  ) {
    self.selected = Some(key);
  }

  pub fn clear_selection(&mut self) {
    self.selected = None;
  }
}
