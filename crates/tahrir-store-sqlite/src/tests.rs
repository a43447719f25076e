//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use serde_json::json;
use tahrir_core::{
  assertion::NewAward,
  badge::{NewBadge, NewInvitation, NewIssuer},
  ids::{new_salt, recipient_hash},
  leaderboard::Window,
  notify::{Notification, NotifyError},
  person::{Lookup, NewPerson},
  quest::NewSeries,
  store::BadgeStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore, StoreConfig, encode::encode_uuid};

type Events = Arc<Mutex<Vec<Notification>>>;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory(StoreConfig::default())
    .await
    .expect("in-memory store")
}

/// A store whose notifier records every published event.
async fn recording_store() -> (SqliteStore, Events) {
  let events: Events = Arc::default();
  let sink = Arc::clone(&events);
  let s = store().await.with_notifier(
    move |e: &Notification| -> Result<(), NotifyError> {
      sink.lock().unwrap().push(e.clone());
      Ok(())
    },
  );
  (s, events)
}

async fn issuer(s: &SqliteStore) -> i64 {
  s.add_issuer(NewIssuer::new("TestOrigin", "TestName", "TestOrg", "TestContact"))
    .await
    .unwrap()
}

async fn badge(s: &SqliteStore, issuer_id: i64, name: &str) -> String {
  s.add_badge(NewBadge::new(
    name,
    "TestImage",
    "A test badge for doing unit tests",
    "TestCriteria",
    issuer_id,
  ))
  .await
  .unwrap()
}

/// Three badges and four persons, like a fresh deployment.
struct Fixture {
  badges: [String; 3],
  emails: [&'static str; 4],
}

async fn fixture(s: &SqliteStore) -> Fixture {
  let issuer_id = issuer(s).await;
  let badges = [
    badge(s, issuer_id, "TestBadge1").await,
    badge(s, issuer_id, "TestBadge2").await,
    badge(s, issuer_id, "TestBadge3").await,
  ];
  let emails = [
    "test_1@tester.com",
    "test_2@tester.com",
    "test_3@tester.com",
    "test_4@tester.com",
  ];
  for email in emails {
    s.add_person(NewPerson::new(email)).await.unwrap();
  }
  Fixture { badges, emails }
}

async fn award(s: &SqliteStore, badge_id: &str, email: &str) {
  let awarded = s.award_badge(NewAward::new(badge_id, email)).await.unwrap();
  assert!(awarded.is_some(), "award of {badge_id} to {email} failed");
}

async fn award_at(s: &SqliteStore, badge_id: &str, email: &str, at: DateTime<Utc>) {
  let awarded = s
    .award_badge(NewAward::new(badge_id, email).issued_on(at))
    .await
    .unwrap();
  assert!(awarded.is_some());
}

async fn rank(s: &SqliteStore, email: &str) -> Option<u32> {
  s.get_person(Lookup::email(email))
    .await
    .unwrap()
    .expect("person exists")
    .rank
}

/// Write an assertion directly, bypassing the award workflow and ranking, as
/// for data that predates rank tracking.
async fn insert_legacy_assertion(s: &SqliteStore, badge_id: &str, email: &str) -> Uuid {
  let id = Uuid::new_v4();
  let salt = new_salt();
  let recipient = recipient_hash(email, &salt);
  let (badge_id, email) = (badge_id.to_owned(), email.to_owned());
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO assertions
           (assertion_id, badge_id, person_id, salt, issued_on, recipient)
         VALUES (?1, ?2, (SELECT id FROM persons WHERE email = ?3), ?4,
                 '2020-01-01T00:00:00.000000000Z', ?5)",
        rusqlite::params![encode_uuid(id), badge_id, email, salt, recipient],
      )?;
      Ok(())
    })
    .await
    .unwrap();
  id
}

// ─── Issuers & badges ────────────────────────────────────────────────────────

#[tokio::test]
async fn add_issuer_is_idempotent() {
  let s = store().await;
  let first = issuer(&s).await;
  let second = issuer(&s).await;
  assert_eq!(first, second);
  assert_eq!(s.get_all_issuers().await.unwrap().len(), 1);

  assert!(s.issuer_exists("TestOrigin".into(), "TestName".into()).await.unwrap());
  assert!(!s.issuer_exists("Elsewhere".into(), "TestName".into()).await.unwrap());
  assert_eq!(s.get_issuer(first).await.unwrap().unwrap().name, "TestName");
}

#[tokio::test]
async fn add_badge_derives_id_and_is_idempotent() {
  let s = store().await;
  let issuer_id = issuer(&s).await;

  let id = badge(&s, issuer_id, "TestBadge").await;
  assert_eq!(id, "testbadge");
  assert_eq!(badge(&s, issuer_id, "TestBadge").await, id);
  assert_eq!(s.get_all_badges().await.unwrap().len(), 1);

  assert!(s.badge_exists("testbadge".into()).await.unwrap());
  let fetched = s.get_badge("TESTBADGE".into()).await.unwrap().unwrap();
  assert_eq!(fetched.name, "TestBadge");
  assert_eq!(fetched.issuer_id, issuer_id);
}

#[tokio::test]
async fn explicit_badge_id_is_kept() {
  let s = store().await;
  let issuer_id = issuer(&s).await;
  let mut new = NewBadge::new("Speak Up!", "img.png", "d", "c", issuer_id);
  new.badge_id = Some("speak-up".into());
  assert_eq!(s.add_badge(new).await.unwrap(), "speak-up");
  assert!(s.badge_exists("speak-up".into()).await.unwrap());
}

#[tokio::test]
async fn badges_from_tags_any_and_all() {
  let s = store().await;
  let issuer_id = issuer(&s).await;
  for (name, tags) in [
    ("TestBadgeA", "test"),
    ("TestBadgeB", "tester"),
    ("TestBadgeC", "test, tester"),
  ] {
    s.add_badge(NewBadge::new(name, "TestImage", "d", "c", issuer_id).with_tags(tags))
      .await
      .unwrap();
  }

  let tags = vec!["test".to_owned(), "tester".to_owned()];
  let any = s.get_badges_from_tags(tags.clone(), false).await.unwrap();
  assert_eq!(any.len(), 3);

  let all = s.get_badges_from_tags(tags, true).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].id, "testbadgec");
  assert_eq!(all[0].tag_list(), vec!["test", "tester"]);

  let none = s.get_badges_from_tags(vec!["tes%".into()], false).await.unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn delete_badge_and_issuer() {
  let s = store().await;
  let issuer_id = issuer(&s).await;
  let id = badge(&s, issuer_id, "Doomed").await;

  assert_eq!(s.delete_badge(id.clone()).await.unwrap(), Some(id.clone()));
  assert_eq!(s.delete_badge(id).await.unwrap(), None);
  assert_eq!(s.delete_issuer(issuer_id).await.unwrap(), Some(issuer_id));
  assert!(s.get_issuer(issuer_id).await.unwrap().is_none());
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_person_defaults_nickname_and_is_idempotent() {
  let s = store().await;
  let id = s.add_person(NewPerson::new("test@tester.com")).await.unwrap();
  let again = s.add_person(NewPerson::new("TEST@tester.com")).await.unwrap();
  assert_eq!(id, again);
  assert_eq!(s.get_all_persons().await.unwrap().len(), 1);

  let person = s.get_person(Lookup::ById(id)).await.unwrap().unwrap();
  assert_eq!(person.email, "test@tester.com");
  assert_eq!(person.nickname, "test");
  assert_eq!(person.rank, None);
  assert_eq!(person.avatar(), "test@tester.com");
  assert!(!person.opt_out);
}

#[tokio::test]
async fn person_lookups_are_case_insensitive() {
  let s = store().await;
  let mut new = NewPerson::new("Alice@Example.com");
  new.nickname = Some("Alice".into());
  let id = s.add_person(new).await.unwrap();

  for lookup in [
    Lookup::email("alice@example.com"),
    Lookup::nickname("ALICE"),
    Lookup::ById(id),
  ] {
    assert!(s.person_exists(lookup.clone()).await.unwrap(), "{lookup}");
    assert_eq!(s.get_person(lookup).await.unwrap().unwrap().id, id);
  }
  assert!(!s.person_exists(Lookup::email("bob@example.com")).await.unwrap());
}

#[tokio::test]
async fn opt_out_round_trip() {
  let s = store().await;
  s.add_person(NewPerson::new("shy@tester.com")).await.unwrap();
  let who = Lookup::email("shy@tester.com");

  assert!(!s.person_opted_out(who.clone()).await.unwrap());
  s.set_opt_out(who.clone(), true).await.unwrap();
  assert!(s.person_opted_out(who).await.unwrap());
  assert!(!s.person_opted_out(Lookup::email("ghost@tester.com")).await.unwrap());

  let err = s
    .set_opt_out(Lookup::email("ghost@tester.com"), true)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(_)));
}

#[tokio::test]
async fn delete_person_by_lookup() {
  let s = store().await;
  let id = s.add_person(NewPerson::new("gone@tester.com")).await.unwrap();
  assert_eq!(s.delete_person(Lookup::nickname("gone")).await.unwrap(), Some(id));
  assert_eq!(s.delete_person(Lookup::ById(id)).await.unwrap(), None);
}

#[tokio::test]
async fn first_login_is_published_once() {
  let (s, events) = recording_store().await;
  let id = s.add_person(NewPerson::new("test@tester.com")).await.unwrap();
  let person = s.get_person(Lookup::ById(id)).await.unwrap().unwrap();
  assert!(person.last_login.is_none());

  let logged = s.note_login(Lookup::nickname(person.nickname)).await.unwrap();
  assert!(logged.last_login.is_some());
  s.note_login(Lookup::ById(id)).await.unwrap();

  let stored = s.get_person(Lookup::ById(id)).await.unwrap().unwrap();
  assert!(stored.last_login.is_some());

  let events = events.lock().unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].agent_name(), "test");
  assert_eq!(events[0].summary(), "test logged into badges for the first time");
  assert_eq!(
    events[0].body().unwrap(),
    json!({ "user": { "username": "test", "badges_user_id": 1 } })
  );
}

#[tokio::test]
async fn note_login_requires_a_person() {
  let s = store().await;
  let err = s.note_login(Lookup::ById(42)).await.unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(Lookup::ById(42))));
}

// ─── Awards ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn award_publishes_award_then_rank_change() {
  let (s, events) = recording_store().await;
  let issuer_id = issuer(&s).await;
  let badge_id = badge(&s, issuer_id, "TestBadge").await;
  s.add_person(NewPerson::new("test@tester.com")).await.unwrap();

  let awarded = s
    .award_badge(NewAward::new(&badge_id, "test@tester.com").issued_for("link"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(awarded.email, "test@tester.com");
  assert_eq!(awarded.badge_id, "testbadge");

  assert!(s.assertion_exists(badge_id.clone(), "test@tester.com".into()).await.unwrap());
  let assertions = s.get_assertions_by_badge(badge_id).await.unwrap();
  assert_eq!(assertions.len(), 1);
  assert_eq!(assertions[0].assertion_id, awarded.assertion_id);
  assert_eq!(assertions[0].issued_for.as_deref(), Some("link"));
  assert!(assertions[0].verify_recipient("test@tester.com"));

  let events = events.lock().unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].summary(), "test was awarded the badge `TestBadge`");
  assert_eq!(
    events[0].body().unwrap(),
    json!({
      "badge": {
        "name": "TestBadge",
        "description": "A test badge for doing unit tests",
        "image_url": "TestImage",
        "badge_id": "testbadge",
      },
      "user": { "username": "test", "badges_user_id": 1 },
    })
  );
  assert_eq!(events[1].summary(), "test's Badges rank changed from None to 1");
  assert_eq!(
    events[1].body().unwrap(),
    json!({
      "person": {
        "email": "test@tester.com",
        "id": 1,
        "nickname": "test",
        "website": null,
        "bio": null,
        "rank": 1,
      },
      "old_rank": null,
    })
  );
}

#[tokio::test]
async fn award_soft_fails_on_missing_person_or_badge() {
  let (s, events) = recording_store().await;
  let issuer_id = issuer(&s).await;
  let badge_id = badge(&s, issuer_id, "TestBadge").await;
  s.add_person(NewPerson::new("test@tester.com")).await.unwrap();

  let no_person = s
    .award_badge(NewAward::new(&badge_id, "nobody@tester.com"))
    .await
    .unwrap();
  let no_badge = s
    .award_badge(NewAward::new("nosuchbadge", "test@tester.com"))
    .await
    .unwrap();

  assert!(no_person.is_none());
  assert!(no_badge.is_none());
  assert!(s.get_assertions_by_email("test@tester.com".into()).await.unwrap().is_empty());
  assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_awards_are_double_counted() {
  let s = store().await;
  let f = fixture(&s).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  award(&s, &f.badges[1], f.emails[1]).await;

  let mine = s.get_assertions_by_email(f.emails[0].into()).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert_ne!(mine[0].assertion_id, mine[1].assertion_id);
  assert_ne!(mine[0].salt, mine[1].salt);

  let board = s.leaderboard(None, None).await.unwrap();
  let first = board.iter().next().unwrap();
  assert_eq!(first.person.email, f.emails[0]);
  assert_eq!(first.badges, 2);
  assert_eq!(rank(&s, f.emails[1]).await, Some(2));
}

#[tokio::test]
async fn failing_notifier_rolls_back_the_award() {
  let s = store().await.with_notifier(|e: &Notification| -> Result<(), NotifyError> {
    match e {
      Notification::RankAdvance { .. } => Err("message bus unavailable".into()),
      _ => Ok(()),
    }
  });
  let f = fixture(&s).await;

  let err = s
    .award_badge(NewAward::new(&f.badges[0], f.emails[0]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tahrir_core::Error::Notification(_))));

  assert!(!s.assertion_exists(f.badges[0].clone(), f.emails[0].into()).await.unwrap());
  assert_eq!(rank(&s, f.emails[0]).await, None);
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ranking_simple() {
  let s = store().await;
  let f = fixture(&s).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  for b in &f.badges {
    award(&s, b, f.emails[3]).await;
  }

  assert_eq!(rank(&s, f.emails[0]).await, Some(2));
  assert_eq!(rank(&s, f.emails[3]).await, Some(1));
}

#[tokio::test]
async fn ranking_tie() {
  let s = store().await;
  let f = fixture(&s).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  for email in [f.emails[1], f.emails[2]] {
    award(&s, &f.badges[0], email).await;
    award(&s, &f.badges[1], email).await;
  }
  for b in &f.badges {
    award(&s, b, f.emails[3]).await;
  }

  assert_eq!(rank(&s, f.emails[0]).await, Some(4));
  assert_eq!(rank(&s, f.emails[1]).await, Some(2));
  assert_eq!(rank(&s, f.emails[2]).await, Some(2));
  assert_eq!(rank(&s, f.emails[3]).await, Some(1));
}

#[tokio::test]
async fn preexisting_persons_are_ranked_on_next_award() {
  let s = store().await;
  let f = fixture(&s).await;

  let legacy = [
    insert_legacy_assertion(&s, &f.badges[0], f.emails[0]).await,
    insert_legacy_assertion(&s, &f.badges[1], f.emails[0]).await,
  ];
  let read_back: Vec<Uuid> = s
    .get_assertions_by_email(f.emails[0].into())
    .await
    .unwrap()
    .iter()
    .map(|a| a.assertion_id)
    .collect();
  assert_eq!(read_back, legacy);
  assert_eq!(rank(&s, f.emails[0]).await, None);

  award(&s, &f.badges[0], f.emails[1]).await;
  assert_eq!(rank(&s, f.emails[0]).await, Some(1));
  assert_eq!(rank(&s, f.emails[1]).await, Some(2));
  // No badges, still unranked.
  assert_eq!(rank(&s, f.emails[2]).await, None);
}

#[tokio::test]
async fn first_award_moves_rank_from_null_and_reshuffles_others() {
  let s = store().await;
  let f = fixture(&s).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  assert_eq!(rank(&s, f.emails[0]).await, Some(1));
  assert_eq!(rank(&s, f.emails[1]).await, None);

  award(&s, &f.badges[0], f.emails[1]).await;
  award(&s, &f.badges[1], f.emails[1]).await;
  assert_eq!(rank(&s, f.emails[1]).await, Some(1));
  assert_eq!(rank(&s, f.emails[0]).await, Some(2));
}

#[tokio::test]
async fn opted_out_persons_never_appear_and_keep_their_rank() {
  let s = store().await;
  let f = fixture(&s).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  assert_eq!(rank(&s, f.emails[0]).await, Some(1));

  s.set_opt_out(Lookup::email(f.emails[0]), true).await.unwrap();
  for b in &f.badges {
    award(&s, b, f.emails[0]).await;
  }
  award(&s, &f.badges[0], f.emails[1]).await;

  let board = s.leaderboard(None, None).await.unwrap();
  assert_eq!(board.len(), 1);
  assert!(board.iter().all(|st| st.person.email != f.emails[0]));
  assert_eq!(rank(&s, f.emails[1]).await, Some(1));
  // Stale, but untouched.
  assert_eq!(rank(&s, f.emails[0]).await, Some(1));
}

#[tokio::test]
async fn leaderboard_window_filters_by_issued_on() {
  let s = store().await;
  let f = fixture(&s).await;
  let now = Utc::now();
  let yesterday = now - Duration::days(1);
  let one_week_ago = now - Duration::days(7);
  let one_month_ago = now - Duration::weeks(4);
  let epsilon = Duration::hours(1);

  award_at(&s, &f.badges[0], f.emails[0], yesterday).await;
  award_at(&s, &f.badges[0], f.emails[3], yesterday).await;
  award_at(&s, &f.badges[1], f.emails[3], one_week_ago).await;
  award_at(&s, &f.badges[2], f.emails[3], one_month_ago).await;

  let p1 = s.get_person(Lookup::email(f.emails[0])).await.unwrap().unwrap().id;
  let p4 = s.get_person(Lookup::email(f.emails[3])).await.unwrap().unwrap().id;

  let mut previous = None;
  for (start, p4_badges) in [
    (yesterday - epsilon, 1),
    (one_week_ago - epsilon, 2),
    (one_month_ago - epsilon, 3),
  ] {
    let board = s.leaderboard(Some(start), Some(now)).await.unwrap();
    assert_eq!(board.get(p1).unwrap().badges, 1);
    assert_eq!(board.get(p4).unwrap().badges, p4_badges);
    if let Some(prev) = previous {
      assert!(board.total_badges() >= prev);
    }
    previous = Some(board.total_badges());
  }

  let narrow = s.leaderboard(Some(yesterday - epsilon), Some(now)).await.unwrap();
  assert_eq!(narrow.rank_of(p1), Some(1));
  assert_eq!(narrow.rank_of(p4), Some(1));
}

#[tokio::test]
async fn window_bounds_are_exact_below_a_microsecond() {
  let s = store().await;
  let f = fixture(&s).await;
  let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
  let issued = base + Duration::nanoseconds(100);
  award_at(&s, &f.badges[0], f.emails[0], issued).await;

  let stored = s.get_assertions_by_email(f.emails[0].into()).await.unwrap();
  assert_eq!(stored[0].issued_on, issued);

  let after = s
    .leaderboard(Some(base + Duration::nanoseconds(500)), Some(base + Duration::seconds(1)))
    .await
    .unwrap();
  assert!(after.is_empty());

  let before = s
    .leaderboard(Some(base - Duration::seconds(1)), Some(base + Duration::nanoseconds(50)))
    .await
    .unwrap();
  assert!(before.is_empty());

  let exact = s.leaderboard(Some(issued), Some(issued)).await.unwrap();
  assert_eq!(exact.total_badges(), 1);
}

#[tokio::test]
async fn windowed_counts_agree_with_window_contains() {
  let s = store().await;
  let f = fixture(&s).await;
  let now = Utc::now();
  let offsets = [
    (0, 0),
    (0, 3),
    (1, 10),
    (1, 40),
    (2, 2),
    (3, 1),
    (3, 8),
    (3, 30),
  ];
  for (who, days_ago) in offsets {
    let badge_id = &f.badges[days_ago as usize % f.badges.len()];
    award_at(&s, badge_id, f.emails[who], now - Duration::days(days_ago)).await;
  }

  let mut issued = Vec::new();
  for email in f.emails {
    let person = s.get_person(Lookup::email(email)).await.unwrap().unwrap();
    let dates: Vec<_> = s
      .get_assertions_by_email(email.into())
      .await
      .unwrap()
      .into_iter()
      .map(|a| a.issued_on)
      .collect();
    issued.push((person.id, dates));
  }

  for (from, to) in [(1, 0), (5, 0), (15, 2), (45, 9), (60, 31), (2, 1)] {
    let window = Window {
      start: now - Duration::days(from) - Duration::hours(1),
      stop:  now - Duration::days(to) + Duration::hours(1),
    };
    let board = s.leaderboard(Some(window.start), Some(window.stop)).await.unwrap();

    for (person_id, dates) in &issued {
      let expected = dates.iter().filter(|at| window.contains(**at)).count() as u32;
      let counted = board.get(*person_id).map_or(0, |st| st.badges);
      assert_eq!(counted, expected, "person {person_id} in {window:?}");
    }
  }
}

#[tokio::test]
async fn a_single_bound_is_ignored() {
  let s = store().await;
  let f = fixture(&s).await;
  let now = Utc::now();
  award_at(&s, &f.badges[0], f.emails[0], now - Duration::weeks(10)).await;
  award_at(&s, &f.badges[1], f.emails[0], now).await;

  let recent = Some(now - Duration::days(1));
  let only_start = s.leaderboard(recent, None).await.unwrap();
  let only_stop = s.leaderboard(None, Some(now - Duration::weeks(20))).await.unwrap();
  let full = s.leaderboard(None, None).await.unwrap();

  assert_eq!(only_start, full);
  assert_eq!(only_stop, full);
  assert_eq!(full.total_badges(), 2);
}

#[tokio::test]
async fn leaderboard_sum_matches_assertion_count() {
  let s = store().await;
  let f = fixture(&s).await;
  award(&s, &f.badges[0], f.emails[0]).await;
  award(&s, &f.badges[1], f.emails[0]).await;
  award(&s, &f.badges[0], f.emails[1]).await;
  award(&s, &f.badges[2], f.emails[2]).await;
  s.set_opt_out(Lookup::email(f.emails[2]), true).await.unwrap();

  let mut visible = 0;
  for email in [f.emails[0], f.emails[1], f.emails[3]] {
    visible += s.get_assertions_by_email(email.into()).await.unwrap().len() as u64;
  }

  let board = s.leaderboard(None, None).await.unwrap();
  assert_eq!(board.total_badges(), visible);
  // Zero-assertion person is absent and unranked.
  let p4 = s.get_person(Lookup::email(f.emails[3])).await.unwrap().unwrap();
  assert!(board.get(p4.id).is_none());
  assert_eq!(p4.rank, None);
}

#[tokio::test]
async fn recalculate_ranks_fills_in_legacy_data() {
  let s = store().await;
  let f = fixture(&s).await;
  let legacy = insert_legacy_assertion(&s, &f.badges[0], f.emails[1]).await;
  let assertions = s.get_assertions_by_email(f.emails[1].into()).await.unwrap();
  assert_eq!(assertions.len(), 1);
  assert_eq!(assertions[0].assertion_id, legacy);
  assert!(assertions[0].verify_recipient(f.emails[1]));
  assert_eq!(s.get_assertions_by_badge(f.badges[0].clone()).await.unwrap().len(), 1);

  let board = s.recalculate_ranks().await.unwrap();
  assert_eq!(board.len(), 1);
  assert_eq!(board.iter().next().unwrap().person.rank, Some(1));
  assert_eq!(rank(&s, f.emails[1]).await, Some(1));
}

#[tokio::test]
async fn assertion_ids_that_are_not_uuids_are_rejected() {
  let s = store().await;
  let f = fixture(&s).await;
  let badge_id = f.badges[0].clone();

  let inserted = s
    .conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO assertions
           (assertion_id, badge_id, person_id, salt, issued_on, recipient)
         VALUES ('testbadge1 -> 1', ?1, 1, 'salt',
                 '2020-01-01T00:00:00.000000000Z', 'r')",
        rusqlite::params![badge_id],
      )?;
      Ok(())
    })
    .await;

  assert!(inserted.is_err());
  assert!(s.get_assertions_by_email(f.emails[0].into()).await.unwrap().is_empty());
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_notifier_in_manual_mode_keeps_earlier_uncommitted_work() {
  let s = SqliteStore::open_in_memory(StoreConfig { autocommit: false })
    .await
    .unwrap()
    .with_notifier(|e: &Notification| -> Result<(), NotifyError> {
      match e {
        Notification::BadgeAward { .. } => Err("message bus unavailable".into()),
        _ => Ok(()),
      }
    });
  let f = fixture(&s).await;

  let err = s
    .award_badge(NewAward::new(&f.badges[0], f.emails[0]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tahrir_core::Error::Notification(_))));

  assert!(s.get_assertions_by_email(f.emails[0].into()).await.unwrap().is_empty());
  assert_eq!(s.get_all_badges().await.unwrap().len(), 3);
  assert_eq!(s.get_all_persons().await.unwrap().len(), 4);

  s.commit().await.unwrap();
  s.rollback().await.unwrap();
  assert_eq!(s.get_all_persons().await.unwrap().len(), 4);
  assert!(!s.assertion_exists(f.badges[0].clone(), f.emails[0].into()).await.unwrap());
}

#[tokio::test]
async fn manual_transactions_commit_and_roll_back() {
  let s = SqliteStore::open_in_memory(StoreConfig { autocommit: false })
    .await
    .unwrap();
  let f = fixture(&s).await;
  s.commit().await.unwrap();

  award(&s, &f.badges[0], f.emails[0]).await;
  assert_eq!(rank(&s, f.emails[0]).await, Some(1));
  s.rollback().await.unwrap();

  assert_eq!(rank(&s, f.emails[0]).await, None);
  assert!(!s.assertion_exists(f.badges[0].clone(), f.emails[0].into()).await.unwrap());
  assert!(s.person_exists(Lookup::email(f.emails[0])).await.unwrap());

  award(&s, &f.badges[0], f.emails[0]).await;
  s.commit().await.unwrap();
  s.rollback().await.unwrap();
  assert_eq!(rank(&s, f.emails[0]).await, Some(1));
}

// ─── Invitations & authorizations ────────────────────────────────────────────

#[tokio::test]
async fn invitation_for_known_badge() {
  let s = store().await;
  let issuer_id = issuer(&s).await;
  let badge_id = badge(&s, issuer_id, "TestBadge").await;
  let creator = s.add_person(NewPerson::new("test@tester.com")).await.unwrap();

  let mut new = NewInvitation::new(&badge_id);
  new.created_by = Some(creator);
  let id = s.add_invitation(new).await.unwrap();
  assert_eq!(id.len(), 32);
  assert!(s.invitation_exists(id.clone()).await.unwrap());

  let invitation = s.get_invitation(id).await.unwrap().unwrap();
  assert_eq!(invitation.badge_id, badge_id);
  assert_eq!(invitation.created_by, Some(creator));
  assert_eq!(invitation.expires_on - invitation.created_on, Duration::hours(1));
  assert!(!invitation.is_expired(invitation.created_on));
}

#[tokio::test]
async fn invitation_for_unknown_badge_is_an_error() {
  let s = store().await;
  let err = s
    .add_invitation(NewInvitation::new("nosuchbadge"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidBadge(ref id) if id == "nosuchbadge"));
}

#[tokio::test]
async fn authorizations() {
  let s = store().await;
  let issuer_id = issuer(&s).await;
  let badge_id = badge(&s, issuer_id, "TestBadge").await;
  let person_id = s.add_person(NewPerson::new("admin@tester.com")).await.unwrap();

  let id = s
    .add_authorization(badge_id.clone(), "admin@tester.com".into())
    .await
    .unwrap()
    .unwrap();
  let again = s
    .add_authorization(badge_id.clone(), "admin@tester.com".into())
    .await
    .unwrap();
  assert_eq!(again, Some(id));

  assert!(s.authorization_exists(badge_id.clone(), "admin@tester.com".into()).await.unwrap());
  let grant = s
    .get_authorization(badge_id.to_uppercase(), "ADMIN@tester.com".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(grant.id, id);
  assert_eq!(grant.badge_id, badge_id);
  assert_eq!(grant.person_id, person_id);
  assert!(s.get_authorization(badge_id.clone(), "nobody@tester.com".into()).await.unwrap().is_none());
  assert!(s.is_authorized(badge_id.clone(), person_id).await.unwrap());
  assert!(!s.is_authorized(badge_id.clone(), person_id + 1).await.unwrap());

  let missing = s
    .add_authorization(badge_id, "nobody@tester.com".into())
    .await
    .unwrap();
  assert!(missing.is_none());
}

// ─── Teams, series, milestones ───────────────────────────────────────────────

#[tokio::test]
async fn team_series_and_milestones() {
  let s = store().await;
  let issuer_id = issuer(&s).await;

  let team_id = s.create_team("TestTeam".into(), None).await.unwrap();
  assert_eq!(team_id, "testteam");
  assert!(s.team_exists("testteam".into()).await.unwrap());
  assert_eq!(s.create_team("TestTeam".into(), None).await.unwrap(), team_id);

  let mut new = NewSeries::new("TestSeries", "A test series", &team_id);
  new.tags = Some("test, series".into());
  let series_id = s.create_series(new.clone()).await.unwrap();
  assert_eq!(series_id, "testseries");
  assert_eq!(s.create_series(new).await.unwrap(), series_id);
  assert!(s.series_exists(series_id.clone()).await.unwrap());
  assert_eq!(s.get_series_from_team(team_id).await.unwrap().len(), 1);
  assert_eq!(s.get_all_series().await.unwrap().len(), 1);

  let b1 = badge(&s, issuer_id, "TestBadge-1").await;
  let b2 = badge(&s, issuer_id, "TestBadge-2").await;
  let m2 = s.create_milestone(2, b2.clone(), series_id.clone()).await.unwrap();
  let m1 = s.create_milestone(1, b1.clone(), series_id.clone()).await.unwrap();
  assert_eq!(s.create_milestone(1, b1.clone(), series_id.clone()).await.unwrap(), m1);

  assert!(s.milestone_exists(m1).await.unwrap());
  assert!(s.milestone_exists(m2).await.unwrap());
  assert!(!s.milestone_exists(m2 + 100).await.unwrap());

  let ordered: Vec<String> = s
    .get_milestones_from_series(series_id.clone())
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.badge_id)
    .collect();
  assert_eq!(ordered, vec![b1, b2]);

  let series = s.get_series(series_id).await.unwrap().unwrap();
  assert!(series.last_updated >= series.created_on);
}
