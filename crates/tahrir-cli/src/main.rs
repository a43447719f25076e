//! `tahrir`: administer a Tahrir badge store from the command line.
//!
//! # Usage
//!
//! ```
//! tahrir init
//! tahrir badge add --name "Speak Up!" --image speak-up.png --issuer 1 \
//!   --description "Spoke at a meeting" --criteria "https://example.org/speak-up"
//! tahrir award speak-up alice@example.org
//! tahrir leaderboard --start 2026-10-01T00:00:00Z --stop 2026-11-01T00:00:00Z
//! ```

mod commands;
mod config;
mod notifier;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tahrir_core::person::Lookup;
use tahrir_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{config::CliConfig, notifier::LogNotifier};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tahrir", version, about = "Administer a Tahrir badge store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tahrir.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create the database schema.
  Init,

  #[command(subcommand)]
  Issuer(IssuerCommand),

  #[command(subcommand)]
  Badge(BadgeCommand),

  #[command(subcommand)]
  Person(PersonCommand),

  /// Award a badge to the person with the given email.
  Award {
    badge_id: String,
    email:    String,
    /// Link to the event that warranted the award.
    #[arg(long)]
    issued_for: Option<String>,
    /// Backdate the award (RFC 3339).
    #[arg(long)]
    issued_on: Option<DateTime<Utc>>,
  },

  /// Record a login, announcing it if it is the person's first.
  Login {
    #[arg(value_parser = parse_lookup)]
    person: Lookup,
  },

  /// Print the leaderboard, optionally restricted to a time window.
  Leaderboard(LeaderboardArgs),

  /// Recompute and store every person's rank.
  Recalculate,
}

#[derive(Subcommand, Debug)]
enum IssuerCommand {
  /// Register an issuing organisation.
  Add {
    #[arg(long)]
    origin:  String,
    #[arg(long)]
    name:    String,
    #[arg(long)]
    org:     String,
    #[arg(long)]
    contact: String,
  },
}

#[derive(Subcommand, Debug)]
enum BadgeCommand {
  /// Define a new badge.
  Add {
    #[arg(long)]
    name:        String,
    #[arg(long)]
    image:       String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    criteria:    String,
    #[arg(long)]
    issuer:      i64,
    /// Comma-separated tags.
    #[arg(long)]
    tags:        Option<String>,
    /// Explicit id; derived from the name otherwise.
    #[arg(long)]
    id:          Option<String>,
  },

  /// List badges carrying the given tags.
  Tagged {
    #[arg(required = true)]
    tags: Vec<String>,
    /// Require every tag rather than any.
    #[arg(long)]
    all:  bool,
  },
}

#[derive(Subcommand, Debug)]
enum PersonCommand {
  /// Register a person.
  Add {
    email: String,
    #[arg(long)]
    nickname: Option<String>,
    #[arg(long)]
    website:  Option<String>,
    #[arg(long)]
    bio:      Option<String>,
  },

  /// Hide a person from the leaderboard.
  OptOut {
    #[arg(value_parser = parse_lookup)]
    person: Lookup,
    /// Opt back in instead.
    #[arg(long)]
    undo:   bool,
  },
}

#[derive(Args, Debug)]
struct LeaderboardArgs {
  /// Window start (RFC 3339). Ignored unless `--stop` is also given.
  #[arg(long)]
  start: Option<DateTime<Utc>>,
  /// Window end (RFC 3339). Ignored unless `--start` is also given.
  #[arg(long)]
  stop:  Option<DateTime<Utc>>,
  /// Print JSON instead of a table.
  #[arg(long)]
  json:  bool,
}

/// An `@` means an email, digits an id, anything else a nickname.
fn parse_lookup(s: &str) -> Result<Lookup, String> {
  if s.is_empty() {
    return Err("person must not be empty".to_owned());
  }
  if s.contains('@') {
    return Ok(Lookup::email(s));
  }
  Ok(s.parse::<i64>().map_or_else(|_| Lookup::nickname(s), Lookup::ById))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  let mut store = SqliteStore::open(&cfg.store_path, cfg.store())
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  if cfg.notify {
    store = store.with_notifier(LogNotifier);
  }

  let mut out = std::io::stdout().lock();
  commands::run(&store, cli.command, &mut out).await?;
  commands::finish(&store).await
}
