//! Assertion queries and the award workflow.

use chrono::Utc;
use rusqlite::{Connection, params};
use tahrir_core::{
  assertion::{Assertion, Awarded, NewAward},
  ids::{new_salt, recipient_hash},
  notify::{self, Notification, Notifier},
  person::Lookup,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Result,
  badges,
  encode::{ASSERTION_COLUMNS, RawAssertion, encode_dt, encode_uuid},
  persons, ranking,
};

pub fn exists(conn: &Connection, badge_id: &str, email: &str) -> Result<bool> {
  let n: i64 = conn.query_row(
    "SELECT COUNT(*) FROM assertions a
     JOIN persons p ON p.id = a.person_id
     WHERE a.badge_id = ?1 AND p.email = ?2",
    params![badge_id, email],
    |r| r.get(0),
  )?;
  Ok(n > 0)
}

fn assertions_where(conn: &Connection, clause: &str, param: &str) -> Result<Vec<Assertion>> {
  let sql = format!(
    "SELECT {ASSERTION_COLUMNS} FROM assertions a
     JOIN persons p ON p.id = a.person_id
     WHERE {clause}
     ORDER BY a.rowid"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![param], RawAssertion::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawAssertion::into_assertion).collect()
}

pub fn by_email(conn: &Connection, email: &str) -> Result<Vec<Assertion>> {
  assertions_where(conn, "p.email = ?1", email)
}

pub fn by_badge(conn: &Connection, badge_id: &str) -> Result<Vec<Assertion>> {
  assertions_where(conn, "a.badge_id = ?1", badge_id)
}

fn insert(conn: &Connection, assertion: &Assertion) -> Result<()> {
  conn.execute(
    "INSERT INTO assertions (
       assertion_id, badge_id, person_id, salt, issued_on, issued_for, recipient
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(assertion.assertion_id),
      assertion.badge_id,
      assertion.person_id,
      assertion.salt,
      encode_dt(assertion.issued_on),
      assertion.issued_for,
      assertion.recipient,
    ],
  )?;
  Ok(())
}

/// Award a badge: insert the assertion, publish the award, re-rank everyone.
///
/// A missing person or badge is a soft failure: `Ok(None)` and nothing is
/// written.
pub fn award(
  conn: &Connection,
  award: NewAward,
  notifier: Option<&dyn Notifier>,
) -> Result<Option<Awarded>> {
  let Some(person) = persons::find(conn, &Lookup::ByEmail(award.email.clone()))? else {
    debug!(email = %award.email, "award skipped: no such person");
    return Ok(None);
  };
  let Some(badge) = badges::find_badge(conn, &award.badge_id)? else {
    debug!(badge_id = %award.badge_id, "award skipped: no such badge");
    return Ok(None);
  };

  let old_rank = person.rank;
  let salt = new_salt();
  let assertion = Assertion {
    assertion_id: Uuid::new_v4(),
    badge_id:     badge.id.clone(),
    person_id:    person.id,
    recipient:    recipient_hash(&person.email, &salt),
    salt,
    issued_on:    award.issued_on.unwrap_or_else(Utc::now),
    issued_for:   award.issued_for,
  };
  insert(conn, &assertion)?;

  info!(
    assertion_id = %assertion.assertion_id,
    badge_id = %badge.id,
    person_id = person.id,
    "badge awarded"
  );

  notify::dispatch(notifier, &Notification::badge_award(&badge, &person))?;
  ranking::adjust_ranks(conn, person.id, old_rank, notifier)?;

  Ok(Some(Awarded {
    email:        person.email,
    badge_id:     badge.id,
    assertion_id: assertion.assertion_id,
  }))
}
