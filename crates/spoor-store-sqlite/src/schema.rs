//! SQL schema for the spoor SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS personas (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- At most one entry per (persona_id, url); writes for an existing pair
-- update the row in place, keeping its id.
CREATE TABLE IF NOT EXISTS history (
    id          TEXT PRIMARY KEY,
    persona_id  TEXT NOT NULL REFERENCES personas(id),
    url         TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    visited_at  TEXT NOT NULL
);

-- One snapshot per history entry; re-capture replaces the row wholesale.
-- persona_id is denormalised for cascade deletion by persona.
CREATE TABLE IF NOT EXISTS page_snapshots (
    history_id  TEXT PRIMARY KEY REFERENCES history(id),
    persona_id  TEXT NOT NULL REFERENCES personas(id),
    url         TEXT NOT NULL,
    captured_at TEXT NOT NULL,
    html        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS insights (
    id              TEXT PRIMARY KEY,
    persona_id      TEXT NOT NULL REFERENCES personas(id),
    insight_summary TEXT NOT NULL,
    category        TEXT NOT NULL,    -- closed vocabulary, e.g. 'arts/entertainment'
    intent          TEXT NOT NULL,    -- closed vocabulary, e.g. 'research/learn'
    score           INTEGER NOT NULL, -- 1..=5
    updated_at      INTEGER NOT NULL, -- epoch milliseconds
    is_deleted      INTEGER NOT NULL DEFAULT 0
);

-- Durable key-value area; holds the active-persona pointer.
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_persona_idx          ON history(persona_id);
CREATE INDEX IF NOT EXISTS history_persona_visited_idx  ON history(persona_id, visited_at);
CREATE UNIQUE INDEX IF NOT EXISTS history_persona_url_idx ON history(persona_id, url);
CREATE INDEX IF NOT EXISTS page_snapshots_persona_idx   ON page_snapshots(persona_id);
CREATE INDEX IF NOT EXISTS insights_persona_idx         ON insights(persona_id);

PRAGMA user_version = 1;
";
