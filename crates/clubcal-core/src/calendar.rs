use chrono::{NaiveDate, Weekday};
use tracing::debug;

use crate::config::CalendarConfig;
use crate::datetime::{DateKey, weekday_labels};
use crate::event::{Event, RegionFilter};
use crate::filter::apply_region_filter;
use crate::grid::{ViewMode, build_grids, period_title, period_window};
use crate::index::EventIndex;
use crate::navigation::Navigator;
use crate::presenter::{CellContext, CellPresentation, Density, IndicatorCaps, present_grid};

/// Inputs for one render of the calendar.
#[derive(Debug, Clone)]
pub struct CalendarQuery<'a> {
    pub view: ViewMode,
    pub cursor: NaiveDate,
    pub selected: Option<&'a DateKey>,
    pub region: RegionFilter,
    pub today: NaiveDate,
    pub week_start: Weekday,
    pub caps: IndicatorCaps,
}

impl<'a> CalendarQuery<'a> {
    pub fn from_navigator(
        nav: &'a Navigator,
        region: RegionFilter,
        today: NaiveDate,
        config: &CalendarConfig,
    ) -> Self {
        Self {
            view: nav.view(),
            cursor: nav.cursor(),
            selected: nav.selected(),
            region,
            today,
            week_start: config.week_start_day(),
            caps: config.caps(Density::for_view(nav.view())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedGrid {
    /// Month name for month and year blocks.
    pub title: Option<String>,
    pub cells: Vec<CellPresentation>,
}

#[derive(Debug, Clone)]
pub struct CalendarSnapshot {
    pub view: ViewMode,
    pub title: String,
    pub weekday_labels: [&'static str; 7],
    pub grids: Vec<PresentedGrid>,
    /// Visible events on the selected date, in source order.
    pub selected_events: Vec<Event>,
    /// Visible events inside the period the view covers.
    pub period_event_count: usize,
}

#[tracing::instrument(skip_all, fields(view = query.view.as_key(), cursor = %query.cursor))]
pub fn build_snapshot(events: &[Event], query: &CalendarQuery<'_>) -> CalendarSnapshot {
    let visible = apply_region_filter(events, query.region);
    let index = EventIndex::build(&visible);

    let ctx = CellContext {
        today: query.today,
        selected: query.selected,
        caps: query.caps,
    };
    let grids: Vec<PresentedGrid> = build_grids(query.view, query.cursor, query.week_start)
        .iter()
        .map(|grid| PresentedGrid {
            title: grid.title(),
            cells: present_grid(grid, &index, &ctx),
        })
        .collect();

    let selected_events = query
        .selected
        .map(|key| index.events_on(key).to_vec())
        .unwrap_or_default();

    let (start, end) = period_window(query.view, query.cursor, query.week_start);
    let period_event_count = visible
        .iter()
        .filter(|event| {
            let day = event.date.date();
            day >= start && day <= end
        })
        .count();

    debug!(
        grids = grids.len(),
        visible = visible.len(),
        period_events = period_event_count,
        "built calendar snapshot"
    );

    CalendarSnapshot {
        view: query.view,
        title: period_title(query.view, query.cursor, query.week_start),
        weekday_labels: weekday_labels(query.week_start),
        grids,
        selected_events,
        period_event_count,
    }
}

/// Events on one date under a region filter, in source order.
pub fn events_on_date(events: &[Event], region: RegionFilter, key: &DateKey) -> Vec<Event> {
    events
        .iter()
        .filter(|event| region.admits(event.region) && &event.date == key)
        .cloned()
        .collect()
}
