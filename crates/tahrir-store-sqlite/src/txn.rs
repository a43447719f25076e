//! Scoped transactions.
//!
//! Every mutating operation runs as one unit. With autocommit the unit is an
//! `IMMEDIATE` transaction, which takes the write lock before anything is
//! read; otherwise it is a savepoint inside the caller's open transaction.
//! Dropping either without committing rolls the unit back.

use rusqlite::{Connection, TransactionBehavior};

use crate::Result;

pub fn scoped<T>(
  conn: &mut Connection,
  autocommit: bool,
  op: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
  if autocommit {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let out = op(&*tx)?;
    tx.commit()?;
    Ok(out)
  } else {
    let sp = conn.savepoint()?;
    let out = op(&*sp)?;
    sp.commit()?;
    Ok(out)
  }
}

/// Open the outer transaction a non-autocommitting store keeps alive.
pub const BEGIN: &str = "BEGIN DEFERRED;";

/// Commit the outer transaction and immediately open the next one.
pub const COMMIT: &str = "COMMIT; BEGIN DEFERRED;";

/// Roll back the outer transaction and immediately open the next one.
pub const ROLLBACK: &str = "ROLLBACK; BEGIN DEFERRED;";
