use std::borrow::Cow;
use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{CalendarSnapshot, PresentedGrid};
use crate::config::CalendarConfig;
use crate::grid::ViewMode;
use crate::permissions::EditableEvent;
use crate::presenter::{CellPresentation, Indicator};

const LEGEND: &str = "K = KZN event, G = Gauteng event, + = more events, * = today, > = selected";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &CalendarConfig) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub fn print_snapshot(&mut self, snapshot: &CalendarSnapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_snapshot(&mut out, snapshot)
    }

    pub fn write_snapshot<W: Write>(
        &self,
        mut out: W,
        snapshot: &CalendarSnapshot,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&snapshot.title, "1"))?;
        writeln!(
            out,
            "{} event{} in view",
            snapshot.period_event_count,
            if snapshot.period_event_count == 1 { "" } else { "s" }
        )?;

        for grid in &snapshot.grids {
            writeln!(out)?;
            if snapshot.view == ViewMode::Year
                && let Some(title) = &grid.title
            {
                writeln!(out, "{title}")?;
            }
            self.write_grid(&mut out, snapshot, grid)?;
        }

        writeln!(out)?;
        writeln!(out, "{LEGEND}")?;
        Ok(())
    }

    fn write_grid<W: Write>(
        &self,
        out: W,
        snapshot: &CalendarSnapshot,
        grid: &PresentedGrid,
    ) -> anyhow::Result<()> {
        let headers: Vec<String> = match snapshot.view {
            ViewMode::Day => grid
                .cells
                .iter()
                .map(|cell| cell.date.weekday().to_string())
                .collect(),
            ViewMode::Week | ViewMode::Month | ViewMode::Year => snapshot
                .weekday_labels
                .iter()
                .map(|label| label.to_string())
                .collect(),
        };

        let rows: Vec<Vec<String>> = grid
            .cells
            .chunks(7)
            .map(|week| week.iter().map(|cell| self.cell_label(cell)).collect())
            .collect();

        write_table(out, &headers, &rows)
    }

    fn cell_label(&self, cell: &CellPresentation) -> String {
        let marker = if cell.is_selected { ">" } else { " " };
        let today = if cell.is_today { "*" } else { " " };

        let day = format!("{marker}{:>2}{today}", cell.day_number);
        let day = if cell.is_muted() {
            self.paint(&day, "2")
        } else if cell.is_today {
            self.paint(&day, "1;34")
        } else {
            day
        };

        if cell.indicators.is_empty() {
            return day;
        }

        let tokens = cell
            .indicators
            .iter()
            .map(|indicator| match indicator {
                Indicator::Dot(_) => self.paint(indicator.token(), "36"),
                Indicator::Overflow => self.paint(indicator.token(), "33"),
            })
            .collect::<String>();
        format!("{day}{tokens}")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_events(&mut self, events: &[EditableEvent]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_events(&mut out, events)
    }

    pub fn write_events<W: Write>(&self, mut out: W, events: &[EditableEvent]) -> anyhow::Result<()> {
        if events.is_empty() {
            writeln!(out, "No events.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Region".to_string(),
            "Club".to_string(),
            "Edit".to_string(),
        ];

        let rows: Vec<Vec<String>> = events
            .iter()
            .map(|entry| {
                vec![
                    self.paint(&entry.event.id, "33"),
                    entry.event.date.to_string(),
                    entry.event.region.to_string(),
                    entry.event.club.clone(),
                    if entry.can_edit { "yes" } else { "" }.to_string(),
                ]
            })
            .collect();

        write_table(&mut out, &headers, &rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Left-aligned columns separated by one space, with a dashed rule under
/// the header. Widths are measured on the visible text of each cell.
fn write_table<W: Write>(
    mut writer: W,
    headers: &[String],
    rows: &[Vec<String>],
) -> anyhow::Result<()> {
    let widths = column_widths(headers, rows);

    write_row(&mut writer, headers, &widths)?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    write_row(&mut writer, &rule, &widths)?;
    for row in rows {
        write_row(&mut writer, row, &widths)?;
    }
    Ok(())
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| visible_width(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }
    widths
}

fn write_row<W: Write>(mut writer: W, cells: &[String], widths: &[usize]) -> anyhow::Result<()> {
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(visible_width(cell));
        write!(writer, "{cell}{} ", " ".repeat(padding))?;
    }
    writeln!(writer)?;
    Ok(())
}

fn visible_width(cell: &str) -> usize {
    UnicodeWidthStr::width(&*strip_ansi(cell))
}

/// Removes SGR color sequences; other text is returned untouched.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    static SGR: OnceLock<Option<Regex>> = OnceLock::new();
    match SGR.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").ok()) {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}
