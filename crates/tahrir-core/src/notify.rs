//! Notification events and the injectable [`Notifier`] boundary.
//!
//! The store publishes one event per significant state change. Transport is
//! the caller's concern; a notifier runs synchronously inside the operation
//! that raised the event, and an error from it aborts that operation.

use serde::Serialize;

use crate::{
  Error, Result,
  badge::Badge,
  person::{Person, PersonSummary},
};

pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

pub trait Notifier: Send + Sync {
  fn notify(&self, event: &Notification) -> Result<(), NotifyError>;
}

impl<F> Notifier for F
where
  F: Fn(&Notification) -> Result<(), NotifyError> + Send + Sync,
{
  fn notify(&self, event: &Notification) -> Result<(), NotifyError> {
    self(event)
  }
}

/// Deliver `event` to `notifier`, if one is configured.
pub fn dispatch(notifier: Option<&dyn Notifier>, event: &Notification) -> Result<()> {
  match notifier {
    Some(n) => n.notify(event).map_err(Error::Notification),
    None => Ok(()),
  }
}

// ─── Body fragments ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
  pub username:       String,
  pub badges_user_id: i64,
}

impl From<&Person> for UserRef {
  fn from(p: &Person) -> Self {
    Self { username: p.nickname.clone(), badges_user_id: p.id }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeRef {
  pub name:        String,
  pub description: String,
  pub image_url:   String,
  pub badge_id:    String,
}

impl From<&Badge> for BadgeRef {
  fn from(b: &Badge) -> Self {
    Self {
      name:        b.name.clone(),
      description: b.description.clone(),
      image_url:   b.image.clone(),
      badge_id:    b.id.clone(),
    }
  }
}

// ─── Notification ────────────────────────────────────────────────────────────

/// Serialises to the event body: the variant's fields, untagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Notification {
  BadgeAward { badge: BadgeRef, user: UserRef },
  PersonLogin { user: UserRef },
  RankAdvance { person: PersonSummary, old_rank: Option<u32> },
}

impl Notification {
  pub fn badge_award(badge: &Badge, person: &Person) -> Self {
    Self::BadgeAward { badge: badge.into(), user: person.into() }
  }

  pub fn person_login(person: &Person) -> Self {
    Self::PersonLogin { user: person.into() }
  }

  pub fn rank_advance(person: &Person, old_rank: Option<u32>) -> Self {
    Self::RankAdvance { person: person.public(), old_rank }
  }

  pub fn topic(&self) -> &'static str {
    match self {
      Self::BadgeAward { .. } => "badge.award",
      Self::PersonLogin { .. } => "person.login.first",
      Self::RankAdvance { .. } => "person.rank.advance",
    }
  }

  /// Nickname of the person the event is about.
  pub fn agent_name(&self) -> &str {
    match self {
      Self::BadgeAward { user, .. } | Self::PersonLogin { user } => &user.username,
      Self::RankAdvance { person, .. } => &person.nickname,
    }
  }

  pub fn summary(&self) -> String {
    match self {
      Self::BadgeAward { badge, user } => {
        format!("{} was awarded the badge `{}`", user.username, badge.name)
      }
      Self::PersonLogin { user } => {
        format!("{} logged into badges for the first time", user.username)
      }
      Self::RankAdvance { person, old_rank } => format!(
        "{}'s Badges rank changed from {} to {}",
        person.nickname,
        display_rank(*old_rank),
        display_rank(person.rank),
      ),
    }
  }

  pub fn body(&self) -> Result<serde_json::Value> { Ok(serde_json::to_value(self)?) }
}

fn display_rank(rank: Option<u32>) -> String {
  rank.map_or_else(|| "None".to_owned(), |r| r.to_string())
}
