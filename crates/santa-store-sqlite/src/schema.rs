//! SQL schema for the exchange SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- AUTOINCREMENT keeps ids monotonic across resets, so id order is
-- registration order.
CREATE TABLE IF NOT EXISTS participants (
    participant_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,
    wishlist       TEXT,
    recipient_id   INTEGER REFERENCES participants(participant_id),
    registered_at  TEXT NOT NULL,       -- ISO 8601 UTC
    CHECK (recipient_id IS NULL OR recipient_id != participant_id)
);

-- The one current game state. Every transition bumps `version`.
CREATE TABLE IF NOT EXISTS game_state (
    state_id    INTEGER PRIMARY KEY CHECK (state_id = 1),
    version     INTEGER NOT NULL,
    status      TEXT NOT NULL,          -- 'registration' | 'completed' | 'reset'
    drawn_at    TEXT,
    price_limit REAL CHECK (price_limit IS NULL OR price_limit >= 0),
    updated_at  TEXT NOT NULL,
    CHECK ((status = 'completed') = (drawn_at IS NOT NULL))
);

-- Append-only copy of every game state version.
CREATE TABLE IF NOT EXISTS game_state_log (
    log_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    version     INTEGER NOT NULL,
    status      TEXT NOT NULL,
    drawn_at    TEXT,
    price_limit REAL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS participants_recipient_idx ON participants(recipient_id);

PRAGMA user_version = 1;
";

/// Seeds the singleton state on first open only.
pub const SEED_STATE: &str = "
INSERT OR IGNORE INTO game_state (state_id, version, status, drawn_at, price_limit, updated_at)
VALUES (1, 1, 'registration', NULL, NULL, ?1)
";
