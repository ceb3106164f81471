use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::datetime::DateKey;
use crate::event::{Region, RegionFilter};
use crate::grid::ViewMode;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "clubcal",
    version,
    about = "Club event calendar: month, week, day and year views with region filtering"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Path to clubcal.toml.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding events.json and the saved region.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Signed-in user id; needed to add, edit or delete events.
    #[arg(long = "user", global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the calendar grid.
    Show(ShowArgs),
    /// Create an event owned by --user.
    Add(AddArgs),
    /// Change an event owned by --user.
    Edit(EditArgs),
    /// Delete an event owned by --user.
    Delete {
        id: String,
    },
    /// List events owned by --user, latest first.
    Mine,
    /// List events on one date under the saved region filter.
    Day {
        #[arg(value_parser = parse_key_arg)]
        date: DateKey,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    #[arg(long, value_parser = parse_view_arg)]
    pub view: Option<ViewMode>,

    /// Cursor date; defaults to today.
    #[arg(long, value_parser = parse_key_arg)]
    pub date: Option<DateKey>,

    /// All, KZN or Gauteng. Saved as the preferred region.
    #[arg(long, value_parser = parse_region_filter_arg)]
    pub region: Option<RegionFilter>,

    #[arg(long, value_parser = parse_key_arg)]
    pub select: Option<DateKey>,

    #[arg(long, action = ArgAction::Count)]
    pub prev: u8,

    #[arg(long, action = ArgAction::Count)]
    pub next: u8,

    /// Jump to today after any other cursor arguments.
    #[arg(long)]
    pub today: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub club: String,

    #[arg(long, value_parser = parse_key_arg)]
    pub date: DateKey,

    #[arg(long, value_parser = parse_region_arg)]
    pub region: Region,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: String,

    #[arg(long)]
    pub club: Option<String>,

    #[arg(long, value_parser = parse_key_arg)]
    pub date: Option<DateKey>,

    #[arg(long, value_parser = parse_region_arg)]
    pub region: Option<Region>,
}

fn parse_key_arg(raw: &str) -> Result<DateKey, String> {
    raw.parse::<DateKey>().map_err(|err| format!("{err:#}"))
}

fn parse_view_arg(raw: &str) -> Result<ViewMode, String> {
    raw.parse::<ViewMode>().map_err(|err| format!("{err:#}"))
}

fn parse_region_arg(raw: &str) -> Result<Region, String> {
    raw.parse::<Region>().map_err(|err| format!("{err:#}"))
}

fn parse_region_filter_arg(raw: &str) -> Result<RegionFilter, String> {
    raw.parse::<RegionFilter>().map_err(|err| format!("{err:#}"))
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
