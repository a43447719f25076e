//! SQLite backend for the Tahrir badge store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod awards;
mod badges;
mod encode;
mod persons;
mod quests;
mod ranking;
mod schema;
mod store;
mod txn;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoreConfig};

#[cfg(test)]
mod tests;
