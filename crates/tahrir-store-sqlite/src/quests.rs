//! Team, series and milestone queries.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params};
use tahrir_core::{
  badge::terminate_tags,
  ids::convert_name_to_id,
  quest::{Milestone, NewSeries, Series, Team},
};
use tracing::debug;

use crate::{
  Result,
  encode::{RawSeries, RawTeam, SERIES_COLUMNS, TEAM_COLUMNS, encode_dt},
};

// ─── Teams ───────────────────────────────────────────────────────────────────

pub fn find_team(conn: &Connection, team_id: &str) -> Result<Option<Team>> {
  let raw = conn
    .query_row(
      &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
      params![team_id],
      RawTeam::from_row,
    )
    .optional()?;
  raw.map(RawTeam::into_team).transpose()
}

pub fn create_team(conn: &Connection, name: &str, team_id: Option<&str>) -> Result<String> {
  let team_id = team_id.map_or_else(|| convert_name_to_id(name), str::to_owned);
  if find_team(conn, &team_id)?.is_some() {
    return Ok(team_id);
  }

  conn.execute(
    "INSERT INTO teams (id, name, created_on) VALUES (?1, ?2, ?3)",
    params![team_id, name, encode_dt(Utc::now())],
  )?;
  debug!(%team_id, "created team");
  Ok(team_id)
}

// ─── Series ──────────────────────────────────────────────────────────────────

pub fn find_series(conn: &Connection, series_id: &str) -> Result<Option<Series>> {
  let raw = conn
    .query_row(
      &format!("SELECT {SERIES_COLUMNS} FROM series WHERE id = ?1"),
      params![series_id],
      RawSeries::from_row,
    )
    .optional()?;
  raw.map(RawSeries::into_series).transpose()
}

pub fn create_series(conn: &Connection, new: &NewSeries) -> Result<String> {
  let series_id = new.resolved_id();
  if find_series(conn, &series_id)?.is_some() {
    return Ok(series_id);
  }

  let now = encode_dt(Utc::now());
  let tags = new.tags.as_deref().map(terminate_tags);
  conn.execute(
    "INSERT INTO series (
       id, name, description, tags, team_id, created_on, last_updated
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    params![series_id, new.name, new.description, tags, new.team_id, now],
  )?;
  debug!(%series_id, team_id = %new.team_id, "created series");
  Ok(series_id)
}

fn series_where(conn: &Connection, clause: &str, param: Option<&str>) -> Result<Vec<Series>> {
  let sql = format!("SELECT {SERIES_COLUMNS} FROM series {clause} ORDER BY id");
  let mut stmt = conn.prepare(&sql)?;
  let raws = match param {
    Some(p) => stmt.query_map(params![p], RawSeries::from_row)?,
    None => stmt.query_map([], RawSeries::from_row)?,
  }
  .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawSeries::into_series).collect()
}

pub fn all_series(conn: &Connection) -> Result<Vec<Series>> {
  series_where(conn, "", None)
}

pub fn series_from_team(conn: &Connection, team_id: &str) -> Result<Vec<Series>> {
  series_where(conn, "WHERE team_id = ?1", Some(team_id))
}

// ─── Milestones ──────────────────────────────────────────────────────────────

/// Pin `badge_id` at `position` in `series_id`. Idempotent on the triple;
/// touches the series' `last_updated` when a milestone is added.
pub fn create_milestone(
  conn: &Connection,
  position: u32,
  badge_id: &str,
  series_id: &str,
) -> Result<i64> {
  let existing: Option<i64> = conn
    .query_row(
      "SELECT id FROM milestones
       WHERE position = ?1 AND badge_id = ?2 AND series_id = ?3",
      params![position, badge_id, series_id],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  conn.execute(
    "INSERT INTO milestones (position, badge_id, series_id) VALUES (?1, ?2, ?3)",
    params![position, badge_id, series_id],
  )?;
  let id = conn.last_insert_rowid();

  conn.execute(
    "UPDATE series SET last_updated = ?1 WHERE id = ?2",
    params![encode_dt(Utc::now()), series_id],
  )?;
  debug!(id, position, %badge_id, %series_id, "created milestone");
  Ok(id)
}

pub fn milestone_exists(conn: &Connection, id: i64) -> Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM milestones WHERE id = ?1", params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

pub fn milestones_from_series(conn: &Connection, series_id: &str) -> Result<Vec<Milestone>> {
  let mut stmt = conn.prepare(
    "SELECT id, position, badge_id, series_id FROM milestones
     WHERE series_id = ?1 ORDER BY position, id",
  )?;
  let milestones = stmt
    .query_map(params![series_id], |row| {
      Ok(Milestone {
        id:        row.get(0)?,
        position:  row.get(1)?,
        badge_id:  row.get(2)?,
        series_id: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(milestones)
}
