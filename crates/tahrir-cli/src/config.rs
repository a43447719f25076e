//! Layered CLI configuration: optional TOML file under `TAHRIR_*` variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use config::{ConfigBuilder, builder::DefaultState};
use serde::Deserialize;
use tahrir_store_sqlite::StoreConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,

  /// Commit after every operation; see [`StoreConfig::autocommit`].
  #[serde(default = "default_true")]
  pub autocommit: bool,

  /// Log every published notification.
  #[serde(default = "default_true")]
  pub notify: bool,
}

fn default_store_path() -> PathBuf { PathBuf::from("tahrir.db") }

fn default_true() -> bool { true }

impl CliConfig {
  /// Read `file` (if it exists), then overlay the environment.
  pub fn load(file: &Path) -> Result<Self> {
    Self::resolve(
      config::Config::builder()
        .add_source(config::File::from(file.to_path_buf()).required(false))
        .add_source(config::Environment::with_prefix("TAHRIR").try_parsing(true)),
    )
  }

  fn resolve(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
    let settings = builder.build().context("failed to read config file")?;
    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn store(&self) -> StoreConfig { StoreConfig { autocommit: self.autocommit } }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
