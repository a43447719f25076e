//! Person queries.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params, types::Value};
use tahrir_core::{
  notify::{self, Notification, Notifier},
  person::{Lookup, NewPerson, Person},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{PERSON_COLUMNS, RawPerson, decode_dt, encode_dt},
};

/// The `WHERE` predicate and its single parameter for a lookup.
fn lookup_clause(lookup: &Lookup) -> (&'static str, Value) {
  match lookup {
    Lookup::ByEmail(email) => ("p.email = ?1", Value::Text(email.clone())),
    Lookup::ById(id) => ("p.id = ?1", Value::Integer(*id)),
    Lookup::ByNickname(nick) => ("p.nickname = ?1", Value::Text(nick.clone())),
  }
}

pub fn find(conn: &Connection, lookup: &Lookup) -> Result<Option<Person>> {
  let (clause, param) = lookup_clause(lookup);
  let sql = format!("SELECT {PERSON_COLUMNS} FROM persons p WHERE {clause}");

  let raw = conn
    .query_row(&sql, params![param], RawPerson::from_row)
    .optional()?;

  raw.map(RawPerson::into_person).transpose()
}

/// Like [`find`], but a miss is an error.
pub fn require(conn: &Connection, lookup: &Lookup) -> Result<Person> {
  find(conn, lookup)?.ok_or_else(|| Error::PersonNotFound(lookup.clone()))
}

pub fn id_for_email(conn: &Connection, email: &str) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM persons WHERE email = ?1",
        params![email],
        |r| r.get(0),
      )
      .optional()?,
  )
}

pub fn exists(conn: &Connection, lookup: &Lookup) -> Result<bool> {
  let (clause, param) = lookup_clause(lookup);
  let sql = format!("SELECT 1 FROM persons p WHERE {clause}");
  Ok(conn.query_row(&sql, params![param], |_| Ok(())).optional()?.is_some())
}

pub fn add(conn: &Connection, new: &NewPerson) -> Result<i64> {
  if let Some(id) = id_for_email(conn, &new.email)? {
    debug!(id, email = %new.email, "person already exists");
    return Ok(id);
  }

  conn.execute(
    "INSERT INTO persons (email, nickname, website, bio, avatar, created_on)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      new.email,
      new.resolved_nickname(),
      new.website,
      new.bio,
      new.avatar,
      encode_dt(Utc::now()),
    ],
  )?;

  let id = conn.last_insert_rowid();
  debug!(id, email = %new.email, "added person");
  Ok(id)
}

pub fn all(conn: &Connection) -> Result<Vec<Person>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM persons p ORDER BY p.id"))?;
  let raws = stmt
    .query_map([], RawPerson::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPerson::into_person).collect()
}

pub fn delete(conn: &Connection, lookup: &Lookup) -> Result<Option<i64>> {
  let Some(person) = find(conn, lookup)? else {
    return Ok(None);
  };
  conn.execute("DELETE FROM persons WHERE id = ?1", params![person.id])?;
  Ok(Some(person.id))
}

pub fn opted_out(conn: &Connection, lookup: &Lookup) -> Result<bool> {
  Ok(find(conn, lookup)?.is_some_and(|p| p.opt_out))
}

pub fn set_opt_out(conn: &Connection, lookup: &Lookup, opt_out: bool) -> Result<()> {
  let person = require(conn, lookup)?;
  conn.execute(
    "UPDATE persons SET opt_out = ?1 WHERE id = ?2",
    params![opt_out, person.id],
  )?;
  Ok(())
}

/// Stamp `last_login`; publish a login event if this is the first one.
pub fn note_login(
  conn: &Connection,
  lookup: &Lookup,
  notifier: Option<&dyn Notifier>,
) -> Result<Person> {
  let mut person = require(conn, lookup)?;
  let first_login = person.last_login.is_none();

  let stamp = encode_dt(Utc::now());
  conn.execute(
    "UPDATE persons SET last_login = ?1 WHERE id = ?2",
    params![stamp, person.id],
  )?;
  person.last_login = Some(decode_dt(&stamp)?);

  if first_login {
    notify::dispatch(notifier, &Notification::person_login(&person))?;
  }
  Ok(person)
}
