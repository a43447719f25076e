//! Persons, the badge recipients, and the ways to look one up.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::default_nickname;

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// How to find a person. Email and nickname comparisons are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
  ByEmail(String),
  ById(i64),
  ByNickname(String),
}

impl Lookup {
  pub fn email(email: impl Into<String>) -> Self { Self::ByEmail(email.into()) }

  pub fn nickname(nickname: impl Into<String>) -> Self {
    Self::ByNickname(nickname.into())
  }
}

impl From<i64> for Lookup {
  fn from(id: i64) -> Self { Self::ById(id) }
}

impl fmt::Display for Lookup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ByEmail(email) => write!(f, "email {email:?}"),
      Self::ById(id) => write!(f, "id {id}"),
      Self::ByNickname(nick) => write!(f, "nickname {nick:?}"),
    }
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A badge recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:         i64,
  pub email:      String,
  pub nickname:   String,
  pub website:    Option<String>,
  pub bio:        Option<String>,
  pub avatar:     Option<String>,
  pub created_on: DateTime<Utc>,
  pub last_login: Option<DateTime<Utc>>,
  /// Opted-out persons never appear on a leaderboard.
  pub opt_out:    bool,
  /// Cached leaderboard rank. `None` until the person has been ranked, which
  /// requires at least one assertion.
  pub rank:       Option<u32>,
}

impl Person {
  /// The avatar source, falling back to the email address.
  pub fn avatar(&self) -> &str { self.avatar.as_deref().unwrap_or(&self.email) }

  /// The fields of a person that may appear in published events.
  pub fn public(&self) -> PersonSummary {
    PersonSummary {
      email:    self.email.clone(),
      id:       self.id,
      nickname: self.nickname.clone(),
      website:  self.website.clone(),
      bio:      self.bio.clone(),
      rank:     self.rank,
    }
  }
}

/// Published projection of a [`Person`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
  pub email:    String,
  pub id:       i64,
  pub nickname: String,
  pub website:  Option<String>,
  pub bio:      Option<String>,
  pub rank:     Option<u32>,
}

// ─── NewPerson ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::BadgeStore::add_person`].
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub email:    String,
  /// Defaults to the local part of `email`.
  pub nickname: Option<String>,
  pub website:  Option<String>,
  pub bio:      Option<String>,
  pub avatar:   Option<String>,
}

impl NewPerson {
  pub fn new(email: impl Into<String>) -> Self {
    Self {
      email:    email.into(),
      nickname: None,
      website:  None,
      bio:      None,
      avatar:   None,
    }
  }

  /// The nickname to store: the supplied one, or the email's local part.
  pub fn resolved_nickname(&self) -> String {
    self
      .nickname
      .clone()
      .unwrap_or_else(|| default_nickname(&self.email))
  }
}
