//! [`SqliteStore`]: the SQLite implementation of [`BadgeStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use tahrir_core::{
  assertion::{Assertion, Awarded, NewAward},
  badge::{Authorization, Badge, Invitation, Issuer, NewBadge, NewInvitation, NewIssuer},
  leaderboard::{Leaderboard, Window},
  notify::Notifier,
  person::{Lookup, NewPerson, Person},
  quest::{Milestone, NewSeries, Series, Team},
  store::BadgeStore,
};

use crate::{Result, awards, badges, persons, quests, ranking, schema::SCHEMA, txn};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Construction-time store settings.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
  /// Commit after every mutating operation. When `false` the caller owns the
  /// transaction boundary via [`BadgeStore::commit`] and
  /// [`BadgeStore::rollback`].
  pub autocommit: bool,
}

impl Default for StoreConfig {
  fn default() -> Self { Self { autocommit: true } }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tahrir badge store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Clones share
/// the connection, and therefore any open caller-controlled transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  config:          StoreConfig,
  notifier:        Option<Arc<dyn Notifier>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, config).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory(config: StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, config).await
  }

  /// Publish award, login and rank events to `notifier`.
  pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
    self.notifier = Some(Arc::new(notifier));
    self
  }

  pub fn config(&self) -> StoreConfig { self.config }

  async fn init(conn: tokio_rusqlite::Connection, config: StoreConfig) -> Result<Self> {
    conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        if !config.autocommit {
          conn.execute_batch(txn::BEGIN)?;
        }
        Ok(())
      })
      .await?;
    debug!(autocommit = config.autocommit, "store initialised");
    Ok(Self { conn, config, notifier: None })
  }

  /// Run a read-only query on the connection thread.
  async fn read<T, F>(&self, op: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(op(&*conn))).await?
  }

  /// Run a mutating operation as one scoped transaction.
  async fn write<T, F>(&self, op: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let autocommit = self.config.autocommit;
    self
      .conn
      .call(move |conn| Ok(txn::scoped(conn, autocommit, op)))
      .await?
  }

  async fn outer_transaction(&self, sql: &'static str) -> Result<()> {
    if self.config.autocommit {
      return Ok(());
    }
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── BadgeStore impl ─────────────────────────────────────────────────────────

impl BadgeStore for SqliteStore {
  type Error = crate::Error;

  // ── Transactions ──────────────────────────────────────────────────────────

  async fn commit(&self) -> Result<()> { self.outer_transaction(txn::COMMIT).await }

  async fn rollback(&self) -> Result<()> { self.outer_transaction(txn::ROLLBACK).await }

  // ── Issuers ───────────────────────────────────────────────────────────────

  async fn issuer_exists(&self, origin: String, name: String) -> Result<bool> {
    self
      .read(move |c| Ok(badges::issuer_id(c, &origin, &name)?.is_some()))
      .await
  }

  async fn add_issuer(&self, issuer: NewIssuer) -> Result<i64> {
    self.write(move |c| badges::add_issuer(c, &issuer)).await
  }

  async fn get_issuer(&self, id: i64) -> Result<Option<Issuer>> {
    self.read(move |c| badges::find_issuer(c, id)).await
  }

  async fn get_all_issuers(&self) -> Result<Vec<Issuer>> {
    self.read(badges::all_issuers).await
  }

  async fn delete_issuer(&self, id: i64) -> Result<Option<i64>> {
    self.write(move |c| badges::delete_issuer(c, id)).await
  }

  // ── Badges ────────────────────────────────────────────────────────────────

  async fn badge_exists(&self, badge_id: String) -> Result<bool> {
    self.read(move |c| badges::badge_exists(c, &badge_id)).await
  }

  async fn add_badge(&self, badge: NewBadge) -> Result<String> {
    self.write(move |c| badges::add_badge(c, &badge)).await
  }

  async fn get_badge(&self, badge_id: String) -> Result<Option<Badge>> {
    self.read(move |c| badges::find_badge(c, &badge_id)).await
  }

  async fn get_all_badges(&self) -> Result<Vec<Badge>> {
    self.read(badges::all_badges).await
  }

  async fn delete_badge(&self, badge_id: String) -> Result<Option<String>> {
    self.write(move |c| badges::delete_badge(c, &badge_id)).await
  }

  async fn get_badges_from_tags(
    &self,
    tags:      Vec<String>,
    match_all: bool,
  ) -> Result<Vec<Badge>> {
    self
      .read(move |c| badges::badges_from_tags(c, &tags, match_all))
      .await
  }

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn person_exists(&self, lookup: Lookup) -> Result<bool> {
    self.read(move |c| persons::exists(c, &lookup)).await
  }

  async fn add_person(&self, person: NewPerson) -> Result<i64> {
    self.write(move |c| persons::add(c, &person)).await
  }

  async fn get_person(&self, lookup: Lookup) -> Result<Option<Person>> {
    self.read(move |c| persons::find(c, &lookup)).await
  }

  async fn get_all_persons(&self) -> Result<Vec<Person>> {
    self.read(persons::all).await
  }

  async fn delete_person(&self, lookup: Lookup) -> Result<Option<i64>> {
    self.write(move |c| persons::delete(c, &lookup)).await
  }

  async fn person_opted_out(&self, lookup: Lookup) -> Result<bool> {
    self.read(move |c| persons::opted_out(c, &lookup)).await
  }

  async fn set_opt_out(&self, lookup: Lookup, opt_out: bool) -> Result<()> {
    self
      .write(move |c| persons::set_opt_out(c, &lookup, opt_out))
      .await
  }

  async fn note_login(&self, lookup: Lookup) -> Result<Person> {
    let notifier = self.notifier.clone();
    self
      .write(move |c| persons::note_login(c, &lookup, notifier.as_deref()))
      .await
  }

  // ── Assertions ────────────────────────────────────────────────────────────

  async fn assertion_exists(&self, badge_id: String, email: String) -> Result<bool> {
    self.read(move |c| awards::exists(c, &badge_id, &email)).await
  }

  async fn get_assertions_by_email(&self, email: String) -> Result<Vec<Assertion>> {
    self.read(move |c| awards::by_email(c, &email)).await
  }

  async fn get_assertions_by_badge(&self, badge_id: String) -> Result<Vec<Assertion>> {
    self.read(move |c| awards::by_badge(c, &badge_id)).await
  }

  async fn award_badge(&self, award: NewAward) -> Result<Option<Awarded>> {
    let notifier = self.notifier.clone();
    self
      .write(move |c| awards::award(c, award, notifier.as_deref()))
      .await
  }

  // ── Ranking ───────────────────────────────────────────────────────────────

  async fn leaderboard(
    &self,
    start: Option<DateTime<Utc>>,
    stop:  Option<DateTime<Utc>>,
  ) -> Result<Leaderboard> {
    let window = Window::from_bounds(start, stop);
    self
      .read(move |c| ranking::compute_leaderboard(c, window))
      .await
  }

  async fn recalculate_ranks(&self) -> Result<Leaderboard> {
    self.write(ranking::recalculate).await
  }

  // ── Invitations ───────────────────────────────────────────────────────────

  async fn add_invitation(&self, invitation: NewInvitation) -> Result<String> {
    self
      .write(move |c| badges::add_invitation(c, &invitation))
      .await
  }

  async fn invitation_exists(&self, id: String) -> Result<bool> {
    self
      .read(move |c| Ok(badges::find_invitation(c, &id)?.is_some()))
      .await
  }

  async fn get_invitation(&self, id: String) -> Result<Option<Invitation>> {
    self.read(move |c| badges::find_invitation(c, &id)).await
  }

  // ── Authorizations ────────────────────────────────────────────────────────

  async fn add_authorization(&self, badge_id: String, email: String) -> Result<Option<i64>> {
    self
      .write(move |c| badges::add_authorization(c, &badge_id, &email))
      .await
  }

  async fn authorization_exists(&self, badge_id: String, email: String) -> Result<bool> {
    self
      .read(move |c| badges::authorization_exists(c, &badge_id, &email))
      .await
  }

  async fn get_authorization(
    &self,
    badge_id: String,
    email:    String,
  ) -> Result<Option<Authorization>> {
    self
      .read(move |c| badges::find_authorization(c, &badge_id, &email))
      .await
  }

  async fn is_authorized(&self, badge_id: String, person_id: i64) -> Result<bool> {
    self
      .read(move |c| badges::is_authorized(c, &badge_id, person_id))
      .await
  }

  // ── Teams, series, milestones ─────────────────────────────────────────────

  async fn create_team(&self, name: String, team_id: Option<String>) -> Result<String> {
    self
      .write(move |c| quests::create_team(c, &name, team_id.as_deref()))
      .await
  }

  async fn team_exists(&self, team_id: String) -> Result<bool> {
    self
      .read(move |c| Ok(quests::find_team(c, &team_id)?.is_some()))
      .await
  }

  async fn get_team(&self, team_id: String) -> Result<Option<Team>> {
    self.read(move |c| quests::find_team(c, &team_id)).await
  }

  async fn create_series(&self, series: NewSeries) -> Result<String> {
    self.write(move |c| quests::create_series(c, &series)).await
  }

  async fn series_exists(&self, series_id: String) -> Result<bool> {
    self
      .read(move |c| Ok(quests::find_series(c, &series_id)?.is_some()))
      .await
  }

  async fn get_series(&self, series_id: String) -> Result<Option<Series>> {
    self.read(move |c| quests::find_series(c, &series_id)).await
  }

  async fn get_all_series(&self) -> Result<Vec<Series>> {
    self.read(quests::all_series).await
  }

  async fn get_series_from_team(&self, team_id: String) -> Result<Vec<Series>> {
    self
      .read(move |c| quests::series_from_team(c, &team_id))
      .await
  }

  async fn create_milestone(
    &self,
    position:  u32,
    badge_id:  String,
    series_id: String,
  ) -> Result<i64> {
    self
      .write(move |c| quests::create_milestone(c, position, &badge_id, &series_id))
      .await
  }

  async fn milestone_exists(&self, id: i64) -> Result<bool> {
    self.read(move |c| quests::milestone_exists(c, id)).await
  }

  async fn get_milestones_from_series(&self, series_id: String) -> Result<Vec<Milestone>> {
    self
      .read(move |c| quests::milestones_from_series(c, &series_id))
      .await
  }
}
