use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::datetime::{DateKey, is_today, to_date_key};
use crate::event::{Event, Region};
use crate::grid::{Grid, ViewMode};
use crate::index::EventIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Normal,
    Compact,
}

impl Density {
    /// Year view packs twelve months on screen and uses the compact caps.
    pub fn for_view(view: ViewMode) -> Self {
        match view {
            ViewMode::Year => Density::Compact,
            ViewMode::Day | ViewMode::Week | ViewMode::Month => Density::Normal,
        }
    }
}

/// How many event dots a single cell may draw.
///
/// `Default` is all zeros, meaning "unset": a partial `[indicators.*]`
/// table deserializes and [`IndicatorCaps::sanitized`] fills in the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorCaps {
    pub per_region: usize,
    pub total: usize,
}

impl IndicatorCaps {
    pub const NORMAL: IndicatorCaps = IndicatorCaps {
        per_region: 3,
        total: 5,
    };
    pub const COMPACT: IndicatorCaps = IndicatorCaps {
        per_region: 2,
        total: 3,
    };

    /// Zero caps fall back to `fallback`; `per_region` never exceeds `total`.
    pub fn sanitized(self, fallback: IndicatorCaps) -> Self {
        let total = if self.total == 0 {
            fallback.total
        } else {
            self.total
        };
        let per_region = if self.per_region == 0 {
            fallback.per_region
        } else {
            self.per_region
        };
        Self {
            per_region: per_region.min(total),
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Dot(Region),
    Overflow,
}

impl Indicator {
    pub fn token(self) -> &'static str {
        match self {
            Indicator::Dot(Region::Kzn) => "K",
            Indicator::Dot(Region::Gauteng) => "G",
            Indicator::Overflow => "+",
        }
    }
}

/// Everything a renderer needs to draw one day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPresentation {
    pub date: NaiveDate,
    pub key: DateKey,
    pub day_number: u32,
    pub is_current_period: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub event_count: usize,
    pub indicators: Vec<Indicator>,
    pub tooltip: String,
}

impl CellPresentation {
    pub fn is_muted(&self) -> bool {
        !self.is_current_period
    }

    pub fn dot_count(&self) -> usize {
        self.indicators
            .iter()
            .filter(|indicator| matches!(indicator, Indicator::Dot(_)))
            .count()
    }

    pub fn has_overflow(&self) -> bool {
        self.indicators.contains(&Indicator::Overflow)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub today: NaiveDate,
    pub selected: Option<&'a DateKey>,
    pub caps: IndicatorCaps,
}

/// Region dots in bucket order, KZN first, capped per region and in total.
/// One overflow marker follows whenever the dots cannot stand for every
/// event in the bucket.
pub fn indicators(events: &[Event], caps: IndicatorCaps) -> Vec<Indicator> {
    let mut out: Vec<Indicator> = Region::ALL
        .into_iter()
        .flat_map(|region| {
            events
                .iter()
                .filter(move |event| event.region == region)
                .take(caps.per_region)
                .map(move |_| Indicator::Dot(region))
        })
        .take(caps.total)
        .collect();

    if out.len() < events.len() {
        out.push(Indicator::Overflow);
    }
    out
}

pub fn tooltip(key: &DateKey, events: &[Event]) -> String {
    if events.is_empty() {
        return key.to_string();
    }

    let plural = if events.len() > 1 { "s" } else { "" };
    let lines = events
        .iter()
        .map(|event| format!("• {} ({})", event.club, event.region))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{key} - {} event{plural}:\n{lines}", events.len())
}

pub fn present_cell(
    date: NaiveDate,
    grid: &Grid,
    index: &EventIndex,
    ctx: &CellContext<'_>,
) -> CellPresentation {
    let key = to_date_key(date);
    let events = index.events_on(&key);

    CellPresentation {
        date,
        day_number: date.day(),
        is_current_period: !grid.is_muted(date),
        is_today: is_today(date, ctx.today),
        is_selected: ctx.selected == Some(&key),
        event_count: events.len(),
        indicators: indicators(events, ctx.caps),
        tooltip: tooltip(&key, events),
        key,
    }
}

pub fn present_grid(
    grid: &Grid,
    index: &EventIndex,
    ctx: &CellContext<'_>,
) -> Vec<CellPresentation> {
    grid.dates
        .iter()
        .map(|date| present_cell(*date, grid, index, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::grid::{month_grid, week_grid};

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn event(club: &str, date: &str, region: Region) -> Event {
        Event::new(
            club.to_string(),
            DateKey::parse(date).expect("valid key"),
            region,
        )
    }

    fn many(count: usize, region: Region) -> Vec<Event> {
        (0..count)
            .map(|n| event(&format!("club {n}"), "2024-03-01", region))
            .collect()
    }

    fn ctx(selected: Option<&DateKey>) -> CellContext<'_> {
        CellContext {
            today: ymd(2024, 3, 20),
            selected,
            caps: IndicatorCaps::NORMAL,
        }
    }

    #[test]
    fn one_dot_per_region_without_overflow() {
        let events = vec![
            event("a", "2024-03-01", Region::Kzn),
            event("b", "2024-03-01", Region::Gauteng),
        ];
        let index = EventIndex::build(&events);
        let grid = month_grid(2024, 3, Weekday::Mon);
        let cell = present_cell(ymd(2024, 3, 1), &grid, &index, &ctx(None));

        assert_eq!(
            cell.indicators,
            vec![Indicator::Dot(Region::Kzn), Indicator::Dot(Region::Gauteng)]
        );
        assert!(!cell.has_overflow());
        assert_eq!(cell.event_count, 2);
    }

    #[test]
    fn seven_kzn_events_show_three_dots_and_overflow() {
        let events = many(7, Region::Kzn);
        let shown = indicators(&events, IndicatorCaps::NORMAL);
        assert_eq!(
            shown,
            vec![
                Indicator::Dot(Region::Kzn),
                Indicator::Dot(Region::Kzn),
                Indicator::Dot(Region::Kzn),
                Indicator::Overflow,
            ]
        );
    }

    #[test]
    fn kzn_dots_come_first_regardless_of_bucket_order() {
        let events = vec![
            event("a", "2024-03-01", Region::Gauteng),
            event("b", "2024-03-01", Region::Kzn),
        ];
        let shown = indicators(&events, IndicatorCaps::NORMAL);
        assert_eq!(
            shown,
            vec![Indicator::Dot(Region::Kzn), Indicator::Dot(Region::Gauteng)]
        );
    }

    #[test]
    fn dots_never_exceed_total_cap() {
        for kzn in 0..8 {
            for gauteng in 0..8 {
                let mut events = many(kzn, Region::Kzn);
                events.extend(many(gauteng, Region::Gauteng));
                for caps in [IndicatorCaps::NORMAL, IndicatorCaps::COMPACT] {
                    let shown = indicators(&events, caps);
                    let dots = shown
                        .iter()
                        .filter(|i| matches!(i, Indicator::Dot(_)))
                        .count();
                    let overflow = shown.contains(&Indicator::Overflow);

                    assert!(dots <= caps.total);
                    assert_eq!(overflow, dots < events.len());
                    if events.len() > caps.total {
                        assert!(overflow);
                    }
                }
            }
        }
    }

    #[test]
    fn compact_caps_mixed_regions() {
        let mut events = many(2, Region::Kzn);
        events.extend(many(2, Region::Gauteng));
        let shown = indicators(&events, IndicatorCaps::COMPACT);
        assert_eq!(
            shown,
            vec![
                Indicator::Dot(Region::Kzn),
                Indicator::Dot(Region::Kzn),
                Indicator::Dot(Region::Gauteng),
                Indicator::Overflow,
            ]
        );
    }

    #[test]
    fn normal_caps_six_mixed_events() {
        let mut events = many(3, Region::Kzn);
        events.extend(many(3, Region::Gauteng));
        let shown = indicators(&events, IndicatorCaps::NORMAL);
        assert_eq!(shown.len(), 6);
        assert_eq!(shown.last(), Some(&Indicator::Overflow));
    }

    #[test]
    fn empty_cell_has_no_indicators() {
        assert!(indicators(&[], IndicatorCaps::NORMAL).is_empty());
    }

    #[test]
    fn flags_for_month_cell() {
        let index = EventIndex::build(&[]);
        let grid = month_grid(2024, 3, Weekday::Mon);
        let selected = DateKey::parse("2024-03-20").expect("valid key");
        let context = ctx(Some(&selected));

        let leading = present_cell(ymd(2024, 2, 26), &grid, &index, &context);
        assert!(leading.is_muted());
        assert!(!leading.is_today);
        assert_eq!(leading.day_number, 26);

        let today = present_cell(ymd(2024, 3, 20), &grid, &index, &context);
        assert!(today.is_current_period);
        assert!(today.is_today);
        assert!(today.is_selected);
        assert_eq!(today.tooltip, "2024-03-20");
    }

    #[test]
    fn week_cells_are_never_muted() {
        let index = EventIndex::build(&[]);
        // Week straddling February and March.
        let grid = week_grid(ymd(2024, 3, 1), Weekday::Mon);
        let cells = present_grid(&grid, &index, &ctx(None));
        assert_eq!(cells.len(), 7);
        assert!(cells.iter().all(|cell| cell.is_current_period));
    }

    #[test]
    fn tooltip_lists_clubs() {
        let events = vec![
            event("Durban AC", "2024-03-01", Region::Kzn),
            event("Joburg RC", "2024-03-01", Region::Gauteng),
        ];
        let key = DateKey::parse("2024-03-01").expect("valid key");
        assert_eq!(
            tooltip(&key, &events),
            "2024-03-01 - 2 events:\n• Durban AC (KZN)\n• Joburg RC (Gauteng)"
        );
        assert_eq!(
            tooltip(&key, &events[..1]),
            "2024-03-01 - 1 event:\n• Durban AC (KZN)"
        );
    }

    #[test]
    fn caps_are_sanitized() {
        let caps = IndicatorCaps {
            per_region: 0,
            total: 0,
        }
        .sanitized(IndicatorCaps::NORMAL);
        assert_eq!(caps, IndicatorCaps::NORMAL);

        let caps = IndicatorCaps {
            per_region: 9,
            total: 4,
        }
        .sanitized(IndicatorCaps::NORMAL);
        assert_eq!(caps.per_region, 4);
    }

    #[test]
    fn density_follows_view() {
        assert_eq!(Density::for_view(ViewMode::Year), Density::Compact);
        assert_eq!(Density::for_view(ViewMode::Month), Density::Normal);
    }
}
