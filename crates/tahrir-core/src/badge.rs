//! Issuers, badges, and the claims and grants attached to a badge.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::convert_name_to_id;

// ─── Issuer ──────────────────────────────────────────────────────────────────

/// An organisation that issues badges. Unique by `(origin, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
  pub id:         i64,
  pub origin:     String,
  pub name:       String,
  pub org:        String,
  pub contact:    String,
  pub created_on: DateTime<Utc>,
}

/// Input to [`crate::store::BadgeStore::add_issuer`].
#[derive(Debug, Clone)]
pub struct NewIssuer {
  pub origin:  String,
  pub name:    String,
  pub org:     String,
  pub contact: String,
}

impl NewIssuer {
  pub fn new(
    origin: impl Into<String>,
    name: impl Into<String>,
    org: impl Into<String>,
    contact: impl Into<String>,
  ) -> Self {
    Self {
      origin:  origin.into(),
      name:    name.into(),
      org:     org.into(),
      contact: contact.into(),
    }
  }
}

// ─── Badge ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
  pub id:          String,
  pub name:        String,
  pub image:       String,
  /// Optional 3D-printable model of the badge.
  pub stl:         Option<String>,
  pub description: String,
  pub criteria:    String,
  pub issuer_id:   i64,
  pub created_on:  DateTime<Utc>,
  /// Comma-terminated tag list, e.g. `"test, tester,"`.
  pub tags:        Option<String>,
}

impl Badge {
  /// The individual tags, trimmed, without empty entries.
  pub fn tag_list(&self) -> Vec<&str> {
    self
      .tags
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .collect()
  }
}

/// Append the terminating comma tag matching relies on.
pub fn terminate_tags(tags: &str) -> String {
  if tags.ends_with(',') {
    tags.to_owned()
  } else {
    format!("{tags},")
  }
}

/// Input to [`crate::store::BadgeStore::add_badge`].
#[derive(Debug, Clone)]
pub struct NewBadge {
  pub name:        String,
  pub image:       String,
  pub description: String,
  pub criteria:    String,
  pub issuer_id:   i64,
  pub tags:        Option<String>,
  /// Explicit id; derived from `name` when absent.
  pub badge_id:    Option<String>,
  pub stl:         Option<String>,
}

impl NewBadge {
  pub fn new(
    name: impl Into<String>,
    image: impl Into<String>,
    description: impl Into<String>,
    criteria: impl Into<String>,
    issuer_id: i64,
  ) -> Self {
    Self {
      name: name.into(),
      image: image.into(),
      description: description.into(),
      criteria: criteria.into(),
      issuer_id,
      tags: None,
      badge_id: None,
      stl: None,
    }
  }

  pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
    self.tags = Some(tags.into());
    self
  }

  pub fn resolved_id(&self) -> String {
    self
      .badge_id
      .clone()
      .unwrap_or_else(|| convert_name_to_id(&self.name))
  }
}

// ─── Invitation ──────────────────────────────────────────────────────────────

/// How long, in hours, an invitation stays claimable when no expiry is given.
pub const DEFAULT_INVITATION_TTL_HOURS: i64 = 1;

/// A time-bounded token allowing a badge to be claimed later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
  pub id:         String,
  pub badge_id:   String,
  pub created_on: DateTime<Utc>,
  pub expires_on: DateTime<Utc>,
  /// The person who issued the invitation, if any.
  pub created_by: Option<i64>,
}

impl Invitation {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now > self.expires_on }
}

/// Input to [`crate::store::BadgeStore::add_invitation`].
#[derive(Debug, Clone)]
pub struct NewInvitation {
  pub badge_id:   String,
  /// Defaults to now.
  pub created_on: Option<DateTime<Utc>>,
  /// Defaults to `created_on` + [`DEFAULT_INVITATION_TTL_HOURS`].
  pub expires_on: Option<DateTime<Utc>>,
  pub created_by: Option<i64>,
}

impl NewInvitation {
  pub fn new(badge_id: impl Into<String>) -> Self {
    Self {
      badge_id:   badge_id.into(),
      created_on: None,
      expires_on: None,
      created_by: None,
    }
  }

  /// Resolve the defaulted timestamps against `now`.
  pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let created_on = self.created_on.unwrap_or(now);
    let expires_on = self
      .expires_on
      .unwrap_or(created_on + Duration::hours(DEFAULT_INVITATION_TTL_HOURS));
    (created_on, expires_on)
  }
}

// ─── Authorization ───────────────────────────────────────────────────────────

/// Grants a person administrative rights over one badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
  pub id:        i64,
  pub badge_id:  String,
  pub person_id: i64,
}
