//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (nanosecond
//! precision, `Z` suffix) so that text comparison orders them
//! chronologically and every `DateTime<Utc>` round-trips exactly. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use tahrir_core::{
  assertion::Assertion,
  badge::{Badge, Invitation, Issuer},
  person::Person,
  quest::{Series, Team},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Persons ─────────────────────────────────────────────────────────────────

/// Columns read into a [`RawPerson`]; the table must be aliased `p`.
pub const PERSON_COLUMNS: &str =
  "p.id, p.email, p.nickname, p.website, p.bio, p.avatar, p.created_on, \
   p.last_login, p.opt_out, p.rank";

/// Number of entries in [`PERSON_COLUMNS`]; the index of the first column
/// after them.
pub const PERSON_COLUMN_COUNT: usize = 10;

pub struct RawPerson {
  pub id:         i64,
  pub email:      String,
  pub nickname:   String,
  pub website:    Option<String>,
  pub bio:        Option<String>,
  pub avatar:     Option<String>,
  pub created_on: String,
  pub last_login: Option<String>,
  pub opt_out:    bool,
  pub rank:       Option<u32>,
}

impl RawPerson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      email:      row.get(1)?,
      nickname:   row.get(2)?,
      website:    row.get(3)?,
      bio:        row.get(4)?,
      avatar:     row.get(5)?,
      created_on: row.get(6)?,
      last_login: row.get(7)?,
      opt_out:    row.get(8)?,
      rank:       row.get(9)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:         self.id,
      email:      self.email,
      nickname:   self.nickname,
      website:    self.website,
      bio:        self.bio,
      avatar:     self.avatar,
      created_on: decode_dt(&self.created_on)?,
      last_login: decode_opt_dt(self.last_login.as_deref())?,
      opt_out:    self.opt_out,
      rank:       self.rank,
    })
  }
}

// ─── Issuers & badges ────────────────────────────────────────────────────────

pub const ISSUER_COLUMNS: &str = "id, origin, name, org, contact, created_on";

pub struct RawIssuer {
  pub id:         i64,
  pub origin:     String,
  pub name:       String,
  pub org:        String,
  pub contact:    String,
  pub created_on: String,
}

impl RawIssuer {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      origin:     row.get(1)?,
      name:       row.get(2)?,
      org:        row.get(3)?,
      contact:    row.get(4)?,
      created_on: row.get(5)?,
    })
  }

  pub fn into_issuer(self) -> Result<Issuer> {
    Ok(Issuer {
      id:         self.id,
      origin:     self.origin,
      name:       self.name,
      org:        self.org,
      contact:    self.contact,
      created_on: decode_dt(&self.created_on)?,
    })
  }
}

/// Columns read into a [`RawBadge`]; the table must be aliased `b`.
pub const BADGE_COLUMNS: &str =
  "b.id, b.name, b.image, b.stl, b.description, b.criteria, b.issuer_id, \
   b.created_on, b.tags";

pub struct RawBadge {
  pub id:          String,
  pub name:        String,
  pub image:       String,
  pub stl:         Option<String>,
  pub description: String,
  pub criteria:    String,
  pub issuer_id:   i64,
  pub created_on:  String,
  pub tags:        Option<String>,
}

impl RawBadge {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      image:       row.get(2)?,
      stl:         row.get(3)?,
      description: row.get(4)?,
      criteria:    row.get(5)?,
      issuer_id:   row.get(6)?,
      created_on:  row.get(7)?,
      tags:        row.get(8)?,
    })
  }

  pub fn into_badge(self) -> Result<Badge> {
    Ok(Badge {
      id:          self.id,
      name:        self.name,
      image:       self.image,
      stl:         self.stl,
      description: self.description,
      criteria:    self.criteria,
      issuer_id:   self.issuer_id,
      created_on:  decode_dt(&self.created_on)?,
      tags:        self.tags,
    })
  }
}

pub const INVITATION_COLUMNS: &str =
  "id, badge_id, created_on, expires_on, created_by";

pub struct RawInvitation {
  pub id:         String,
  pub badge_id:   String,
  pub created_on: String,
  pub expires_on: String,
  pub created_by: Option<i64>,
}

impl RawInvitation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      badge_id:   row.get(1)?,
      created_on: row.get(2)?,
      expires_on: row.get(3)?,
      created_by: row.get(4)?,
    })
  }

  pub fn into_invitation(self) -> Result<Invitation> {
    Ok(Invitation {
      id:         self.id,
      badge_id:   self.badge_id,
      created_on: decode_dt(&self.created_on)?,
      expires_on: decode_dt(&self.expires_on)?,
      created_by: self.created_by,
    })
  }
}

// ─── Assertions ──────────────────────────────────────────────────────────────

/// Columns read into a [`RawAssertion`]; the table must be aliased `a`.
pub const ASSERTION_COLUMNS: &str =
  "a.assertion_id, a.badge_id, a.person_id, a.salt, a.issued_on, \
   a.issued_for, a.recipient";

pub struct RawAssertion {
  pub assertion_id: String,
  pub badge_id:     String,
  pub person_id:    i64,
  pub salt:         String,
  pub issued_on:    String,
  pub issued_for:   Option<String>,
  pub recipient:    String,
}

impl RawAssertion {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assertion_id: row.get(0)?,
      badge_id:     row.get(1)?,
      person_id:    row.get(2)?,
      salt:         row.get(3)?,
      issued_on:    row.get(4)?,
      issued_for:   row.get(5)?,
      recipient:    row.get(6)?,
    })
  }

  pub fn into_assertion(self) -> Result<Assertion> {
    Ok(Assertion {
      assertion_id: decode_uuid(&self.assertion_id)?,
      badge_id:     self.badge_id,
      person_id:    self.person_id,
      salt:         self.salt,
      issued_on:    decode_dt(&self.issued_on)?,
      issued_for:   self.issued_for,
      recipient:    self.recipient,
    })
  }
}

// ─── Teams & series ──────────────────────────────────────────────────────────

pub const TEAM_COLUMNS: &str = "id, name, created_on";

pub struct RawTeam {
  pub id:         String,
  pub name:       String,
  pub created_on: String,
}

impl RawTeam {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      created_on: row.get(2)?,
    })
  }

  pub fn into_team(self) -> Result<Team> {
    Ok(Team {
      id:         self.id,
      name:       self.name,
      created_on: decode_dt(&self.created_on)?,
    })
  }
}

pub const SERIES_COLUMNS: &str =
  "id, name, description, team_id, tags, created_on, last_updated";

pub struct RawSeries {
  pub id:           String,
  pub name:         String,
  pub description:  String,
  pub team_id:      String,
  pub tags:         Option<String>,
  pub created_on:   String,
  pub last_updated: String,
}

impl RawSeries {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      team_id:      row.get(3)?,
      tags:         row.get(4)?,
      created_on:   row.get(5)?,
      last_updated: row.get(6)?,
    })
  }

  pub fn into_series(self) -> Result<Series> {
    Ok(Series {
      id:           self.id,
      name:         self.name,
      description:  self.description,
      team_id:      self.team_id,
      tags:         self.tags,
      created_on:   decode_dt(&self.created_on)?,
      last_updated: decode_dt(&self.last_updated)?,
    })
  }
}
