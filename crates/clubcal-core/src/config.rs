use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::WeekStart;
use crate::grid::ViewMode;
use crate::presenter::{
  Density,
  IndicatorCaps
};

const CONFIG_FILE: &str = "clubcal.toml";
const CONFIG_ENV_VAR: &str =
  "CLUBCAL_CONFIG";
const APP_DIR: &str = "clubcal";

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(default)]
pub struct IndicatorConfig {
  pub normal:  IndicatorCaps,
  pub compact: IndicatorCaps
}

impl Default for IndicatorConfig {
  fn default() -> Self {
    Self {
      normal:  IndicatorCaps::NORMAL,
      compact: IndicatorCaps::COMPACT
    }
  }
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
#[serde(default)]
pub struct CalendarConfig {
  pub week_start:   WeekStart,
  pub default_view: ViewMode,
  pub data_dir:     Option<String>,
  pub color:        bool,
  pub indicators:   IndicatorConfig,
  #[serde(skip)]
  pub loaded_from:  Option<PathBuf>
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      week_start:   WeekStart::Monday,
      default_view: ViewMode::Month,
      data_dir:     None,
      color:        true,
      indicators:   IndicatorConfig::default(),
      loaded_from:  None
    }
  }
}

impl CalendarConfig {
  /// Reads the first config file found
  /// (explicit path, `CLUBCAL_CONFIG`, then
  /// the user config dir). No file means
  /// defaults.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)
    else {
      warn!(
        "no clubcal.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    if !path.exists() {
      if override_path.is_some() {
        return Err(anyhow!(
          "config file {} does not exist",
          path.display()
        ));
      }
      info!(
        file = %path.display(),
        "config file not found; using defaults"
      );
      return Ok(Self::default());
    }

    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut config =
      Self::from_toml_str(&raw)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;
    config.loaded_from = Some(path);

    info!(
      file = ?config.loaded_from,
      week_start = %config.week_start,
      default_view = config.default_view.as_key(),
      "loaded calendar config"
    );
    Ok(config)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(raw)
        .context(
          "invalid calendar config"
        )?;
    config.sanitize();
    Ok(config)
  }

  pub fn sanitize(&mut self) {
    let normal = self
      .indicators
      .normal
      .sanitized(IndicatorCaps::NORMAL);
    if normal != self.indicators.normal
    {
      debug!(
        ?normal,
        "adjusted normal indicator caps"
      );
      self.indicators.normal = normal;
    }

    let compact = self
      .indicators
      .compact
      .sanitized(IndicatorCaps::COMPACT);
    if compact != self.indicators.compact
    {
      debug!(
        ?compact,
        "adjusted compact indicator caps"
      );
      self.indicators.compact = compact;
    }
  }

  pub fn week_start_day(&self) -> Weekday {
    self.week_start.weekday()
  }

  pub fn caps(
    &self,
    density: Density
  ) -> IndicatorCaps {
    match density {
      | Density::Normal => {
        self.indicators.normal
      }
      | Density::Compact => {
        self.indicators.compact
      }
    }
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &CalendarConfig,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.data_dir.as_deref()
  {
    expand_tilde(Path::new(cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(expand_tilde(path));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(expand_tilde(
        Path::new(trimmed)
      ));
    }
  }

  dirs::config_dir().map(|dir| {
    dir.join(APP_DIR).join(CONFIG_FILE)
  })
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let base = dirs::data_dir()
    .or_else(dirs::home_dir)
    .ok_or_else(|| {
      anyhow!(
        "cannot determine data \
         directory"
      )
    })?;
  Ok(base.join(APP_DIR))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}
