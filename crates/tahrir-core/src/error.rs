//! Error types for `tahrir-core`.

use thiserror::Error;

use crate::notify::NotifyError;

#[derive(Debug, Error)]
pub enum Error {
  /// The injected notifier rejected an event. Aborts the enclosing operation.
  #[error("notification failed: {0}")]
  Notification(#[source] NotifyError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
