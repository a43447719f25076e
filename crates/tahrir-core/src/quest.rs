//! Teams, series and milestones: progressive groupings of badges.
//!
//! A team owns series; a series owns milestones; each milestone pins one
//! badge to one position in its series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::convert_name_to_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub id:         String,
  pub name:       String,
  pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
  pub id:           String,
  pub name:         String,
  pub description:  String,
  pub team_id:      String,
  pub tags:         Option<String>,
  pub created_on:   DateTime<Utc>,
  pub last_updated: DateTime<Utc>,
}

/// Input to [`crate::store::BadgeStore::create_series`].
#[derive(Debug, Clone)]
pub struct NewSeries {
  pub name:        String,
  pub description: String,
  pub team_id:     String,
  pub tags:        Option<String>,
  /// Explicit id; derived from `name` when absent.
  pub series_id:   Option<String>,
}

impl NewSeries {
  pub fn new(
    name: impl Into<String>,
    description: impl Into<String>,
    team_id: impl Into<String>,
  ) -> Self {
    Self {
      name:        name.into(),
      description: description.into(),
      team_id:     team_id.into(),
      tags:        None,
      series_id:   None,
    }
  }

  pub fn resolved_id(&self) -> String {
    self
      .series_id
      .clone()
      .unwrap_or_else(|| convert_name_to_id(&self.name))
  }
}

/// A badge's position within a series. `(position, badge_id, series_id)` is
/// unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
  pub id:        i64,
  pub position:  u32,
  pub badge_id:  String,
  pub series_id: String,
}
