//! Error type for `tahrir-store-sqlite`.

use tahrir_core::person::Lookup;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Includes notifier failures, which abort the enclosing transaction.
  #[error("core error: {0}")]
  Core(#[from] tahrir_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An invitation referenced a badge that does not exist.
  #[error("invalid badge id: {0}")]
  InvalidBadge(String),

  /// A lookup that was required to match a person did not.
  #[error("person not found: {0}")]
  PersonNotFound(Lookup),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
