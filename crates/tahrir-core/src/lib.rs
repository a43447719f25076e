//! Core types and trait definitions for the Tahrir badge store.
//!
//! This crate is deliberately free of database dependencies. Ranking is a
//! pure computation over per-person badge counts; persisting the result is
//! the backend's job.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assertion;
pub mod badge;
pub mod error;
pub mod ids;
pub mod leaderboard;
pub mod notify;
pub mod person;
pub mod quest;
pub mod store;

pub use error::{Error, Result};
