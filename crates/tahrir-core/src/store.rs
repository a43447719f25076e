//! The `BadgeStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tahrir-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend.
//!
//! `add_*` and `create_*` operations are idempotent on their natural key:
//! adding something that already exists is a no-op returning the existing
//! id. The exception is [`BadgeStore::add_invitation`], which fails if the
//! badge is unknown.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  assertion::{Assertion, Awarded, NewAward},
  badge::{Authorization, Badge, Invitation, Issuer, NewBadge, NewInvitation, NewIssuer},
  leaderboard::Leaderboard,
  person::{Lookup, NewPerson, Person},
  quest::{Milestone, NewSeries, Series, Team},
};

/// Abstraction over a Tahrir badge store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait BadgeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Transactions ──────────────────────────────────────────────────────

  /// Commit the caller-controlled transaction. A no-op for autocommitting
  /// stores.
  fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Discard everything since the last commit. A no-op for autocommitting
  /// stores.
  fn rollback(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Issuers ───────────────────────────────────────────────────────────

  fn issuer_exists(
    &self,
    origin: String,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_issuer(
    &self,
    issuer: NewIssuer,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  fn get_issuer(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Issuer>, Self::Error>> + Send + '_;

  fn get_all_issuers(
    &self,
  ) -> impl Future<Output = Result<Vec<Issuer>, Self::Error>> + Send + '_;

  /// Returns the id if an issuer was deleted.
  fn delete_issuer(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  // ── Badges ────────────────────────────────────────────────────────────

  fn badge_exists(
    &self,
    badge_id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Add a badge and return its id, derived from the name unless given.
  fn add_badge(
    &self,
    badge: NewBadge,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Case-insensitive on `badge_id`.
  fn get_badge(
    &self,
    badge_id: String,
  ) -> impl Future<Output = Result<Option<Badge>, Self::Error>> + Send + '_;

  fn get_all_badges(
    &self,
  ) -> impl Future<Output = Result<Vec<Badge>, Self::Error>> + Send + '_;

  fn delete_badge(
    &self,
    badge_id: String,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Badges tagged with any (or, with `match_all`, every) one of `tags`.
  fn get_badges_from_tags(
    &self,
    tags: Vec<String>,
    match_all: bool,
  ) -> impl Future<Output = Result<Vec<Badge>, Self::Error>> + Send + '_;

  // ── Persons ───────────────────────────────────────────────────────────

  fn person_exists(
    &self,
    lookup: Lookup,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Add a person and return their id. Idempotent on email.
  fn add_person(
    &self,
    person: NewPerson,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    lookup: Lookup,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn get_all_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn delete_person(
    &self,
    lookup: Lookup,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// `false` for unknown persons.
  fn person_opted_out(
    &self,
    lookup: Lookup,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_opt_out(
    &self,
    lookup: Lookup,
    opt_out: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Stamp `last_login`. The first login publishes a login notification.
  fn note_login(
    &self,
    lookup: Lookup,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  // ── Assertions ────────────────────────────────────────────────────────

  fn assertion_exists(
    &self,
    badge_id: String,
    email: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_assertions_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Vec<Assertion>, Self::Error>> + Send + '_;

  fn get_assertions_by_badge(
    &self,
    badge_id: String,
  ) -> impl Future<Output = Result<Vec<Assertion>, Self::Error>> + Send + '_;

  /// Award a badge, publish the award, and recompute every rank, all in one
  /// transaction.
  ///
  /// Returns `None`, without writing anything, if the person or the badge
  /// does not exist. Duplicate awards are not prevented.
  fn award_badge(
    &self,
    award: NewAward,
  ) -> impl Future<Output = Result<Option<Awarded>, Self::Error>> + Send + '_;

  // ── Ranking ───────────────────────────────────────────────────────────

  /// Compute the leaderboard, counting only assertions issued within
  /// `[start, stop]` when both bounds are given. Read-only.
  fn leaderboard(
    &self,
    start: Option<DateTime<Utc>>,
    stop: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Leaderboard, Self::Error>> + Send + '_;

  /// Rewrite every cached rank from the all-time leaderboard without
  /// awarding anything.
  fn recalculate_ranks(
    &self,
  ) -> impl Future<Output = Result<Leaderboard, Self::Error>> + Send + '_;

  // ── Invitations ───────────────────────────────────────────────────────

  /// Create an invitation and return its token. Fails if the badge is
  /// unknown.
  fn add_invitation(
    &self,
    invitation: NewInvitation,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  fn invitation_exists(
    &self,
    id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_invitation(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Option<Invitation>, Self::Error>> + Send + '_;

  // ── Authorizations ────────────────────────────────────────────────────

  /// Grant `email` admin rights over `badge_id`. `None` if either is
  /// unknown.
  fn add_authorization(
    &self,
    badge_id: String,
    email: String,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  fn authorization_exists(
    &self,
    badge_id: String,
    email: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The grant of `badge_id` to the person with `email`, if any.
  fn get_authorization(
    &self,
    badge_id: String,
    email: String,
  ) -> impl Future<Output = Result<Option<Authorization>, Self::Error>> + Send + '_;

  fn is_authorized(
    &self,
    badge_id: String,
    person_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Teams, series, milestones ─────────────────────────────────────────

  fn create_team(
    &self,
    name: String,
    team_id: Option<String>,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  fn team_exists(
    &self,
    team_id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_team(
    &self,
    team_id: String,
  ) -> impl Future<Output = Result<Option<Team>, Self::Error>> + Send + '_;

  fn create_series(
    &self,
    series: NewSeries,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  fn series_exists(
    &self,
    series_id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_series(
    &self,
    series_id: String,
  ) -> impl Future<Output = Result<Option<Series>, Self::Error>> + Send + '_;

  fn get_all_series(
    &self,
  ) -> impl Future<Output = Result<Vec<Series>, Self::Error>> + Send + '_;

  fn get_series_from_team(
    &self,
    team_id: String,
  ) -> impl Future<Output = Result<Vec<Series>, Self::Error>> + Send + '_;

  fn create_milestone(
    &self,
    position: u32,
    badge_id: String,
    series_id: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  fn milestone_exists(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Ordered by position.
  fn get_milestones_from_series(
    &self,
    series_id: String,
  ) -> impl Future<Output = Result<Vec<Milestone>, Self::Error>> + Send + '_;
}
