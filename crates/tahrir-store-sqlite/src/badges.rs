//! Issuer, badge, invitation and authorization queries.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use tahrir_core::{
  badge::{
    Authorization, Badge, Invitation, Issuer, NewBadge, NewInvitation, NewIssuer,
    terminate_tags,
  },
  ids::new_invitation_id,
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{
    BADGE_COLUMNS, INVITATION_COLUMNS, ISSUER_COLUMNS, RawBadge, RawInvitation,
    RawIssuer, encode_dt,
  },
  persons,
};

// ─── Issuers ─────────────────────────────────────────────────────────────────

pub fn issuer_id(conn: &Connection, origin: &str, name: &str) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM issuers WHERE origin = ?1 AND name = ?2",
        params![origin, name],
        |r| r.get(0),
      )
      .optional()?,
  )
}

pub fn add_issuer(conn: &Connection, new: &NewIssuer) -> Result<i64> {
  if let Some(id) = issuer_id(conn, &new.origin, &new.name)? {
    return Ok(id);
  }

  conn.execute(
    "INSERT INTO issuers (origin, name, org, contact, created_on)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![new.origin, new.name, new.org, new.contact, encode_dt(Utc::now())],
  )?;

  let id = conn.last_insert_rowid();
  debug!(id, name = %new.name, "added issuer");
  Ok(id)
}

pub fn find_issuer(conn: &Connection, id: i64) -> Result<Option<Issuer>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ISSUER_COLUMNS} FROM issuers WHERE id = ?1"),
      params![id],
      RawIssuer::from_row,
    )
    .optional()?;
  raw.map(RawIssuer::into_issuer).transpose()
}

pub fn all_issuers(conn: &Connection) -> Result<Vec<Issuer>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {ISSUER_COLUMNS} FROM issuers ORDER BY id"))?;
  let raws = stmt
    .query_map([], RawIssuer::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawIssuer::into_issuer).collect()
}

pub fn delete_issuer(conn: &Connection, id: i64) -> Result<Option<i64>> {
  let n = conn.execute("DELETE FROM issuers WHERE id = ?1", params![id])?;
  Ok((n > 0).then_some(id))
}

// ─── Badges ──────────────────────────────────────────────────────────────────

pub fn find_badge(conn: &Connection, badge_id: &str) -> Result<Option<Badge>> {
  let raw = conn
    .query_row(
      &format!("SELECT {BADGE_COLUMNS} FROM badges b WHERE b.id = ?1"),
      params![badge_id],
      RawBadge::from_row,
    )
    .optional()?;
  raw.map(RawBadge::into_badge).transpose()
}

pub fn badge_exists(conn: &Connection, badge_id: &str) -> Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM badges WHERE id = ?1", params![badge_id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

pub fn add_badge(conn: &Connection, new: &NewBadge) -> Result<String> {
  let badge_id = new.resolved_id();
  if let Some(existing) = find_badge(conn, &badge_id)? {
    return Ok(existing.id);
  }

  let tags = new.tags.as_deref().map(terminate_tags);
  conn.execute(
    "INSERT INTO badges (
       id, name, image, stl, description, criteria, issuer_id, created_on, tags
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      badge_id,
      new.name,
      new.image,
      new.stl,
      new.description,
      new.criteria,
      new.issuer_id,
      encode_dt(Utc::now()),
      tags,
    ],
  )?;

  debug!(%badge_id, "added badge");
  Ok(badge_id)
}

pub fn all_badges(conn: &Connection) -> Result<Vec<Badge>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {BADGE_COLUMNS} FROM badges b ORDER BY b.id"))?;
  let raws = stmt
    .query_map([], RawBadge::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawBadge::into_badge).collect()
}

pub fn delete_badge(conn: &Connection, badge_id: &str) -> Result<Option<String>> {
  let Some(badge) = find_badge(conn, badge_id)? else {
    return Ok(None);
  };
  conn.execute("DELETE FROM badges WHERE id = ?1", params![badge.id])?;
  Ok(Some(badge.id))
}

/// Escape LIKE wildcards so a tag only ever matches literally.
fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

/// Badges whose tag list contains `"<tag>,"` for any (or every) tag.
pub fn badges_from_tags(
  conn: &Connection,
  tags: &[String],
  match_all: bool,
) -> Result<Vec<Badge>> {
  if tags.is_empty() {
    return Ok(Vec::new());
  }

  let conds: Vec<String> = (1..=tags.len())
    .map(|i| format!("b.tags LIKE ?{i} ESCAPE '\\'"))
    .collect();
  let joiner = if match_all { " AND " } else { " OR " };
  let sql = format!(
    "SELECT {BADGE_COLUMNS} FROM badges b WHERE {} ORDER BY b.id",
    conds.join(joiner)
  );

  let patterns: Vec<String> = tags
    .iter()
    .map(|t| format!("%{},%", escape_like(t.trim())))
    .collect();

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(patterns.iter()), RawBadge::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawBadge::into_badge).collect()
}

// ─── Invitations ─────────────────────────────────────────────────────────────

pub fn add_invitation(conn: &Connection, new: &NewInvitation) -> Result<String> {
  let badge = find_badge(conn, &new.badge_id)?
    .ok_or_else(|| Error::InvalidBadge(new.badge_id.clone()))?;

  let id = new_invitation_id();
  let (created_on, expires_on) = new.window(Utc::now());
  conn.execute(
    "INSERT INTO invitations (id, badge_id, created_on, expires_on, created_by)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      id,
      badge.id,
      encode_dt(created_on),
      encode_dt(expires_on),
      new.created_by,
    ],
  )?;

  debug!(%id, badge_id = %badge.id, "added invitation");
  Ok(id)
}

pub fn find_invitation(conn: &Connection, id: &str) -> Result<Option<Invitation>> {
  let raw = conn
    .query_row(
      &format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = ?1"),
      params![id],
      RawInvitation::from_row,
    )
    .optional()?;
  raw.map(RawInvitation::into_invitation).transpose()
}

// ─── Authorizations ──────────────────────────────────────────────────────────

fn authorization_id(conn: &Connection, badge_id: &str, person_id: i64) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM authorizations WHERE badge_id = ?1 AND person_id = ?2",
        params![badge_id, person_id],
        |r| r.get(0),
      )
      .optional()?,
  )
}

/// `None` when either the badge or the person is unknown.
pub fn add_authorization(
  conn: &Connection,
  badge_id: &str,
  email: &str,
) -> Result<Option<i64>> {
  let Some(person_id) = persons::id_for_email(conn, email)? else {
    return Ok(None);
  };
  let Some(badge) = find_badge(conn, badge_id)? else {
    return Ok(None);
  };

  if let Some(id) = authorization_id(conn, &badge.id, person_id)? {
    return Ok(Some(id));
  }

  conn.execute(
    "INSERT INTO authorizations (badge_id, person_id) VALUES (?1, ?2)",
    params![badge.id, person_id],
  )?;
  Ok(Some(conn.last_insert_rowid()))
}

pub fn find_authorization(
  conn: &Connection,
  badge_id: &str,
  email: &str,
) -> Result<Option<Authorization>> {
  Ok(
    conn
      .query_row(
        "SELECT a.id, a.badge_id, a.person_id FROM authorizations a
         JOIN persons p ON p.id = a.person_id
         WHERE a.badge_id = ?1 AND p.email = ?2",
        params![badge_id, email],
        |row| {
          Ok(Authorization {
            id:        row.get(0)?,
            badge_id:  row.get(1)?,
            person_id: row.get(2)?,
          })
        },
      )
      .optional()?,
  )
}

pub fn authorization_exists(conn: &Connection, badge_id: &str, email: &str) -> Result<bool> {
  Ok(find_authorization(conn, badge_id, email)?.is_some())
}

pub fn is_authorized(conn: &Connection, badge_id: &str, person_id: i64) -> Result<bool> {
  Ok(authorization_id(conn, badge_id, person_id)?.is_some())
}
