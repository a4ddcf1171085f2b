//! SQL schema for the levelbook SQLite store.
//!
//! [`PRAGMAS`] run on every connection; [`SCHEMA`] runs while
//! `PRAGMA user_version` is still 0.

/// Per-connection settings.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Schema version written by [`SCHEMA`].
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "

CREATE TABLE IF NOT EXISTS surveys (
    survey_id         TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    instrument        TEXT NOT NULL DEFAULT '',
    datum_rl          REAL NOT NULL,
    chainage_multiple INTEGER NOT NULL,
    finished          INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL   -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS purposes (
    purpose_id        TEXT PRIMARY KEY,
    survey_id         TEXT NOT NULL REFERENCES surveys(survey_id),
    kind              TEXT NOT NULL,   -- display label, e.g. 'Initial Level'
    phase             TEXT NOT NULL,   -- 'actual' | 'proposal'
    status            TEXT NOT NULL DEFAULT 'active',
    final_fore_sight  REAL,
    created_at        TEXT NOT NULL
);

-- Rows are append-only. The only row ever removed is the provisional last
-- row of a paused purpose, replaced in the same transaction on resume.
CREATE TABLE IF NOT EXISTS observations (
    purpose_id     TEXT NOT NULL REFERENCES purposes(purpose_id),
    seq            INTEGER NOT NULL,   -- 1, 2, 3, … per purpose
    reading_json   TEXT NOT NULL,      -- serialised Reading, including its type tag
    remarks        TEXT,
    reduction_json TEXT,               -- levels computed at commit time
    recorded_at    TEXT NOT NULL,
    PRIMARY KEY (purpose_id, seq),
    CHECK (seq >= 1)
);

CREATE INDEX IF NOT EXISTS purposes_survey_idx ON purposes(survey_id);

PRAGMA user_version = 1;
";
