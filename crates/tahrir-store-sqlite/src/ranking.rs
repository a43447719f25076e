//! Leaderboard queries and rank persistence.
//!
//! [`compute_leaderboard`] is a pure read; [`persist_ranks`] writes a
//! computed board back onto `persons.rank`. [`adjust_ranks`] chains the two
//! after an award, inside the award's transaction.

use rusqlite::{Connection, Row, params};
use tahrir_core::{
  leaderboard::{Leaderboard, Window},
  notify::{self, Notification, Notifier},
  person::{Lookup, Person},
};
use tracing::{debug, info};

use crate::{
  Result,
  encode::{PERSON_COLUMN_COUNT, PERSON_COLUMNS, RawPerson, encode_dt},
  persons,
};

fn count_row(row: &Row<'_>) -> rusqlite::Result<(RawPerson, u32)> {
  Ok((RawPerson::from_row(row)?, row.get(PERSON_COLUMN_COUNT)?))
}

/// Count assertions per non-opted-out person, optionally restricted to
/// `window`, and rank the result.
pub fn compute_leaderboard(conn: &Connection, window: Option<Window>) -> Result<Leaderboard> {
  let range = if window.is_some() {
    "AND a.issued_on BETWEEN ?1 AND ?2"
  } else {
    ""
  };
  let sql = format!(
    "SELECT {PERSON_COLUMNS}, COUNT(a.assertion_id) AS badges
     FROM persons p
     JOIN assertions a ON a.person_id = p.id
     WHERE p.opt_out = 0 {range}
     GROUP BY p.id
     ORDER BY badges DESC, p.id ASC"
  );

  let mut stmt = conn.prepare(&sql)?;
  let rows = match window {
    Some(w) => stmt.query_map(params![encode_dt(w.start), encode_dt(w.stop)], count_row)?,
    None => stmt.query_map([], count_row)?,
  }
  .collect::<rusqlite::Result<Vec<_>>>()?;

  let counts = rows
    .into_iter()
    .map(|(raw, badges)| Ok((raw.into_person()?, badges)))
    .collect::<Result<Vec<(Person, u32)>>>()?;

  Ok(Leaderboard::from_counts(counts))
}

/// Overwrite the cached rank of every person on `board`. Persons absent from
/// it keep whatever rank they had, including `NULL`.
pub fn persist_ranks(conn: &Connection, board: &Leaderboard) -> Result<usize> {
  let mut stmt = conn.prepare_cached("UPDATE persons SET rank = ?1 WHERE id = ?2")?;
  let mut updated = 0;
  for standing in board {
    updated += stmt.execute(params![standing.rank, standing.person.id])?;
  }
  debug!(updated, "persisted ranks");
  Ok(updated)
}

/// Recompute the all-time leaderboard and persist it.
pub fn recalculate(conn: &Connection) -> Result<Leaderboard> {
  let mut board = compute_leaderboard(conn, None)?;
  persist_ranks(conn, &board)?;
  board.apply_ranks();
  Ok(board)
}

/// Re-rank everyone after `person_id` was awarded a badge, then publish the
/// rank change against the rank they held before the award.
pub fn adjust_ranks(
  conn: &Connection,
  person_id: i64,
  old_rank: Option<u32>,
  notifier: Option<&dyn Notifier>,
) -> Result<Leaderboard> {
  let board = recalculate(conn)?;

  let person = persons::require(conn, &Lookup::ById(person_id))?;
  info!(
    person_id,
    old_rank = ?old_rank,
    new_rank = ?person.rank,
    ranked = board.len(),
    "ranks recomputed"
  );

  notify::dispatch(notifier, &Notification::rank_advance(&person, old_rank))?;
  Ok(board)
}
