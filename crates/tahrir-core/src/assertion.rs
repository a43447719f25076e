//! Assertions: one badge awarded to one person.
//!
//! Assertions are append-only: they are never updated and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::recipient_hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
  /// Surrogate key. Awarding the same badge twice yields two assertions.
  pub assertion_id: Uuid,
  pub badge_id:     String,
  pub person_id:    i64,
  pub salt:         String,
  pub issued_on:    DateTime<Utc>,
  /// Optional link back to the event that warranted the award.
  pub issued_for:   Option<String>,
  /// Hex `sha256(email ‖ salt)`.
  pub recipient:    String,
}

impl Assertion {
  /// The hashed recipient in Open Badges `algorithm$digest` form.
  pub fn recipient_identity(&self) -> String { format!("sha256${}", self.recipient) }

  /// Whether `email` is the address this assertion was issued to.
  pub fn verify_recipient(&self, email: &str) -> bool {
    recipient_hash(email, &self.salt) == self.recipient
  }
}

/// Input to [`crate::store::BadgeStore::award_badge`].
#[derive(Debug, Clone)]
pub struct NewAward {
  pub badge_id:   String,
  pub email:      String,
  /// Defaults to the current UTC time.
  pub issued_on:  Option<DateTime<Utc>>,
  pub issued_for: Option<String>,
}

impl NewAward {
  pub fn new(badge_id: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      badge_id:   badge_id.into(),
      email:      email.into(),
      issued_on:  None,
      issued_for: None,
    }
  }

  pub fn issued_on(mut self, at: DateTime<Utc>) -> Self {
    self.issued_on = Some(at);
    self
  }

  pub fn issued_for(mut self, link: impl Into<String>) -> Self {
    self.issued_for = Some(link.into());
    self
  }
}

/// What a successful award returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Awarded {
  pub email:        String,
  pub badge_id:     String,
  pub assertion_id: Uuid,
}
