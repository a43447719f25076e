//! SQL schema for the Tahrir SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS issuers (
    id          INTEGER PRIMARY KEY,
    origin      TEXT NOT NULL,
    name        TEXT NOT NULL UNIQUE,
    org         TEXT NOT NULL,
    contact     TEXT NOT NULL,
    created_on  TEXT NOT NULL
);

-- Badge ids compare case-insensitively everywhere they appear.
CREATE TABLE IF NOT EXISTS badges (
    id           TEXT PRIMARY KEY COLLATE NOCASE,
    name         TEXT NOT NULL UNIQUE,
    image        TEXT NOT NULL,
    stl          TEXT,
    description  TEXT NOT NULL,
    criteria     TEXT NOT NULL,
    issuer_id    INTEGER NOT NULL REFERENCES issuers(id),
    created_on   TEXT NOT NULL,
    tags         TEXT              -- comma-terminated, e.g. 'test, tester,'
);

CREATE TABLE IF NOT EXISTS persons (
    id          INTEGER PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    nickname    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    website     TEXT,
    bio         TEXT,
    avatar      TEXT,
    created_on  TEXT NOT NULL,
    last_login  TEXT,
    opt_out     INTEGER NOT NULL DEFAULT 0,
    rank        INTEGER            -- NULL until first ranked
);

-- Assertions are strictly append-only. Ids are hyphenated UUIDs.
CREATE TABLE IF NOT EXISTS assertions (
    assertion_id TEXT PRIMARY KEY CHECK (
        length(assertion_id) = 36
        AND substr(assertion_id, 9, 1) = '-'
        AND substr(assertion_id, 14, 1) = '-'
        AND substr(assertion_id, 19, 1) = '-'
        AND substr(assertion_id, 24, 1) = '-'
    ),
    badge_id     TEXT NOT NULL COLLATE NOCASE REFERENCES badges(id),
    person_id    INTEGER NOT NULL REFERENCES persons(id),
    salt         TEXT NOT NULL,
    issued_on    TEXT NOT NULL,    -- fixed-width RFC 3339 UTC
    issued_for   TEXT,
    recipient    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invitations (
    id          TEXT PRIMARY KEY,
    badge_id    TEXT NOT NULL COLLATE NOCASE REFERENCES badges(id),
    created_on  TEXT NOT NULL,
    expires_on  TEXT NOT NULL,
    created_by  INTEGER REFERENCES persons(id)
);

CREATE TABLE IF NOT EXISTS authorizations (
    id          INTEGER PRIMARY KEY,
    badge_id    TEXT NOT NULL COLLATE NOCASE REFERENCES badges(id),
    person_id   INTEGER NOT NULL REFERENCES persons(id),
    UNIQUE (badge_id, person_id)
);

CREATE TABLE IF NOT EXISTS teams (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_on  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS series (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    description   TEXT NOT NULL,
    tags          TEXT,
    team_id       TEXT NOT NULL REFERENCES teams(id),
    created_on    TEXT NOT NULL,
    last_updated  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS milestones (
    id          INTEGER PRIMARY KEY,
    position    INTEGER NOT NULL,
    badge_id    TEXT NOT NULL COLLATE NOCASE REFERENCES badges(id),
    series_id   TEXT NOT NULL REFERENCES series(id),
    UNIQUE (position, badge_id, series_id)
);

CREATE INDEX IF NOT EXISTS assertions_person_idx ON assertions(person_id);
CREATE INDEX IF NOT EXISTS assertions_badge_idx  ON assertions(badge_id);
CREATE INDEX IF NOT EXISTS assertions_issued_idx ON assertions(issued_on);
CREATE INDEX IF NOT EXISTS series_team_idx       ON series(team_id);
CREATE INDEX IF NOT EXISTS milestones_series_idx ON milestones(series_id);

PRAGMA user_version = 1;
";
