pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod event;
pub mod filter;
pub mod grid;
pub mod index;
pub mod navigation;
pub mod permissions;
pub mod presenter;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting clubcal"
  );

  let cfg = config::CalendarConfig::load(
    cli.config.as_deref()
  )?;
  debug!(?cfg, "effective config");

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::LocalStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open event store \
         at {}",
        data_dir.display()
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg);
  let session = commands::Session {
    user:  cli.user.as_deref(),
    today: datetime::local_today(),
    now:   Utc::now()
  };
  let command = cli.command.unwrap_or(
    cli::Command::Show(
      cli::ShowArgs::default()
    )
  );

  commands::dispatch(
    &store,
    &cfg,
    &mut renderer,
    &session,
    command
  )?;

  info!("done");
  Ok(())
}
