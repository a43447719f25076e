//! Leaderboard computation.
//!
//! Ranking is pure: given each eligible person's badge count, assign ranks.
//! Counting assertions and persisting the resulting ranks onto persons are
//! backend concerns built on top of [`Leaderboard::from_counts`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::person::Person;

// ─── Window ──────────────────────────────────────────────────────────────────

/// An inclusive `issued_on` range restricting which assertions are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub start: DateTime<Utc>,
  pub stop:  DateTime<Utc>,
}

impl Window {
  /// Build a window from optional bounds.
  ///
  /// Both bounds must be present. If only one is given, both are ignored and
  /// the full history is counted.
  pub fn from_bounds(
    start: Option<DateTime<Utc>>,
    stop: Option<DateTime<Utc>>,
  ) -> Option<Self> {
    match (start, stop) {
      (Some(start), Some(stop)) => Some(Self { start, stop }),
      _ => None,
    }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at <= self.stop
  }
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

/// One person's place on a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
  pub person: Person,
  pub badges: u32,
  pub rank:   u32,
}

/// Persons ordered by descending badge count (ascending rank).
///
/// Only persons who have not opted out and hold at least one counted
/// assertion are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Leaderboard {
  standings: Vec<Standing>,
}

impl Leaderboard {
  /// Rank `(person, badge_count)` pairs.
  ///
  /// Equal counts share a rank; the next distinct count is ranked by its
  /// position, so counts `[5, 5, 5, 2]` rank `[1, 1, 1, 4]`. The sort is
  /// stable, so persons tied on count keep their input order.
  pub fn from_counts(counts: impl IntoIterator<Item = (Person, u32)>) -> Self {
    let mut counts: Vec<(Person, u32)> = counts
      .into_iter()
      .filter(|(person, badges)| !person.opt_out && *badges > 0)
      .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut standings = Vec::with_capacity(counts.len());
    let mut prev: Option<(u32, u32)> = None;

    for (idx, (person, badges)) in counts.into_iter().enumerate() {
      let rank = match prev {
        Some((prev_badges, prev_rank)) if prev_badges == badges => prev_rank,
        _ => idx as u32 + 1,
      };
      prev = Some((badges, rank));
      standings.push(Standing { person, badges, rank });
    }

    Self { standings }
  }

  /// Copy each standing's rank onto its person snapshot, matching what
  /// persisting the board writes.
  pub fn apply_ranks(&mut self) {
    for standing in &mut self.standings {
      standing.person.rank = Some(standing.rank);
    }
  }

  pub fn get(&self, person_id: i64) -> Option<&Standing> {
    self.standings.iter().find(|s| s.person.id == person_id)
  }

  pub fn rank_of(&self, person_id: i64) -> Option<u32> {
    self.get(person_id).map(|s| s.rank)
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Standing> { self.standings.iter() }

  pub fn len(&self) -> usize { self.standings.len() }

  pub fn is_empty(&self) -> bool { self.standings.is_empty() }

  /// Sum of counted assertions across every standing.
  pub fn total_badges(&self) -> u64 {
    self.standings.iter().map(|s| u64::from(s.badges)).sum()
  }
}

impl IntoIterator for Leaderboard {
  type Item = Standing;
  type IntoIter = std::vec::IntoIter<Standing>;

  fn into_iter(self) -> Self::IntoIter { self.standings.into_iter() }
}

impl<'a> IntoIterator for &'a Leaderboard {
  type Item = &'a Standing;
  type IntoIter = std::slice::Iter<'a, Standing>;

  fn into_iter(self) -> Self::IntoIter { self.standings.iter() }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn person(id: i64) -> Person {
    Person {
      id,
      email: format!("test_{id}@tester.com"),
      nickname: format!("test_{id}"),
      website: None,
      bio: None,
      avatar: None,
      created_on: Utc::now(),
      last_login: None,
      opt_out: false,
      rank: None,
    }
  }

  fn ranks(board: &Leaderboard) -> Vec<(i64, u32)> {
    board.iter().map(|s| (s.person.id, s.rank)).collect()
  }

  #[test]
  fn higher_count_ranks_first() {
    let board = Leaderboard::from_counts([(person(1), 1), (person(4), 3)]);
    assert_eq!(ranks(&board), vec![(4, 1), (1, 2)]);
  }

  #[test]
  fn ties_share_rank_and_next_tier_skips() {
    let board = Leaderboard::from_counts([
      (person(1), 1),
      (person(2), 2),
      (person(3), 2),
      (person(4), 3),
    ]);
    assert_eq!(board.rank_of(4), Some(1));
    assert_eq!(board.rank_of(2), Some(2));
    assert_eq!(board.rank_of(3), Some(2));
    assert_eq!(board.rank_of(1), Some(4));
  }

  #[test]
  fn three_way_tie_at_top() {
    let board = Leaderboard::from_counts([
      (person(1), 5),
      (person(2), 5),
      (person(3), 5),
      (person(4), 2),
    ]);
    let got: Vec<u32> = board.iter().map(|s| s.rank).collect();
    assert_eq!(got, vec![1, 1, 1, 4]);
  }

  #[test]
  fn opted_out_and_zero_counts_are_absent() {
    let mut shy = person(2);
    shy.opt_out = true;
    let board =
      Leaderboard::from_counts([(person(1), 2), (shy, 9), (person(3), 0)]);

    assert_eq!(board.len(), 1);
    assert!(board.get(2).is_none());
    assert!(board.get(3).is_none());
    assert_eq!(board.rank_of(1), Some(1));
  }

  #[test]
  fn total_badges_sums_counts() {
    let board =
      Leaderboard::from_counts([(person(1), 2), (person(2), 2), (person(3), 1)]);
    assert_eq!(board.total_badges(), 5);
  }

  #[test]
  fn empty_input_yields_empty_board() {
    let board = Leaderboard::from_counts(Vec::new());
    assert!(board.is_empty());
  }

  #[test]
  fn window_needs_both_bounds() {
    let now = Utc::now();
    let yesterday = now - Duration::days(1);

    assert!(Window::from_bounds(Some(yesterday), None).is_none());
    assert!(Window::from_bounds(None, Some(now)).is_none());

    let window = Window::from_bounds(Some(yesterday), Some(now)).unwrap();
    assert!(window.contains(yesterday));
    assert!(window.contains(now));
    assert!(!window.contains(now + Duration::seconds(1)));
  }
}
