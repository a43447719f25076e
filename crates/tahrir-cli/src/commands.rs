//! Subcommand handlers. Each runs one [`BadgeStore`] operation and prints the
//! result.

use std::io::Write;

use anyhow::{Context as _, Result};
use tahrir_core::{
  assertion::NewAward,
  badge::{NewBadge, NewIssuer},
  leaderboard::Leaderboard,
  person::NewPerson,
  store::BadgeStore,
};
use tracing::warn;

use crate::{BadgeCommand, Command, IssuerCommand, LeaderboardArgs, PersonCommand};

pub async fn run<S: BadgeStore>(
  store: &S,
  command: Command,
  out: &mut impl Write,
) -> Result<()> {
  match command {
    Command::Init => writeln!(out, "store ready")?,

    Command::Issuer(IssuerCommand::Add { origin, name, org, contact }) => {
      let id = store
        .add_issuer(NewIssuer::new(origin, name, org, contact))
        .await
        .context("failed to add issuer")?;
      writeln!(out, "{id}")?;
    }

    Command::Badge(BadgeCommand::Add {
      name,
      image,
      description,
      criteria,
      issuer,
      tags,
      id,
    }) => {
      let mut badge = NewBadge::new(name, image, description, criteria, issuer);
      badge.tags = tags;
      badge.badge_id = id;
      let id = store.add_badge(badge).await.context("failed to add badge")?;
      writeln!(out, "{id}")?;
    }

    Command::Badge(BadgeCommand::Tagged { tags, all }) => {
      let badges = store
        .get_badges_from_tags(tags, all)
        .await
        .context("failed to query badges by tag")?;
      for badge in badges {
        writeln!(out, "{}\t{}", badge.id, badge.name)?;
      }
    }

    Command::Person(PersonCommand::Add { email, nickname, website, bio }) => {
      let mut person = NewPerson::new(email);
      person.nickname = nickname;
      person.website = website;
      person.bio = bio;
      let id = store.add_person(person).await.context("failed to add person")?;
      writeln!(out, "{id}")?;
    }

    Command::Person(PersonCommand::OptOut { person, undo }) => {
      store
        .set_opt_out(person.clone(), !undo)
        .await
        .with_context(|| format!("failed to update opt-out for {person}"))?;
      let state = if undo { "opted in" } else { "opted out" };
      writeln!(out, "{person} {state}")?;
    }

    Command::Award { badge_id, email, issued_for, issued_on } => {
      let award = NewAward {
        badge_id: badge_id.clone(),
        email: email.clone(),
        issued_on,
        issued_for,
      };
      match store.award_badge(award).await.context("failed to award badge")? {
        Some(awarded) => writeln!(out, "{}", awarded.assertion_id)?,
        None => warn!(%badge_id, %email, "no such person or badge; nothing awarded"),
      }
    }

    Command::Login { person } => {
      let person = store
        .note_login(person)
        .await
        .context("failed to record login")?;
      writeln!(out, "{}", serde_json::to_string_pretty(&person.public())?)?;
    }

    Command::Leaderboard(LeaderboardArgs { start, stop, json }) => {
      let board = store
        .leaderboard(start, stop)
        .await
        .context("failed to compute leaderboard")?;
      if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&board)?)?;
      } else {
        print_board(&board, out)?;
      }
    }

    Command::Recalculate => {
      let board = store
        .recalculate_ranks()
        .await
        .context("failed to recalculate ranks")?;
      writeln!(out, "ranked {} persons", board.len())?;
    }
  }
  Ok(())
}

/// Commit the outer transaction of a store not in autocommit mode.
pub async fn finish<S: BadgeStore>(store: &S) -> Result<()> {
  store.commit().await.context("failed to commit")
}

fn print_board(board: &Leaderboard, out: &mut impl Write) -> Result<()> {
  writeln!(out, "{:>4}  {:>6}  nickname", "rank", "badges")?;
  for standing in board {
    writeln!(
      out,
      "{:>4}  {:>6}  {}",
      standing.rank, standing.badges, standing.person.nickname
    )?;
  }
  Ok(())
}
