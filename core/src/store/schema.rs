//! Sqlite schema for the persisted tables.

use rusqlite::Connection;

/// Create all tables and indexes if they do not exist. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS matches (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            source_name   TEXT NOT NULL UNIQUE,
            archive_hash  TEXT NOT NULL,
            bracket_id    INTEGER,
            turns         INTEGER NOT NULL,
            ingested_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS match_players (
            match_id        INTEGER NOT NULL,
            player_id       INTEGER NOT NULL,
            name            TEXT NOT NULL,
            nation          TEXT,
            participant_id  INTEGER,
            PRIMARY KEY (match_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS tournament_participants (
            id               INTEGER PRIMARY KEY,
            display_name     TEXT NOT NULL,
            normalized_name  TEXT NOT NULL,
            seed             INTEGER
        );

        CREATE TABLE IF NOT EXISTS participant_name_overrides (
            match_id        INTEGER NOT NULL,
            raw_name        TEXT NOT NULL,
            participant_id  INTEGER NOT NULL,
            reason          TEXT NOT NULL,
            PRIMARY KEY (match_id, raw_name)
        );

        CREATE TABLE IF NOT EXISTS events (
            id         INTEGER PRIMARY KEY,
            match_id   INTEGER NOT NULL,
            turn       INTEGER NOT NULL,
            family     TEXT NOT NULL,
            player_id  INTEGER,
            payload    TEXT NOT NULL,
            source     TEXT NOT NULL,
            text       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_match_turn
            ON events (match_id, turn);

        CREATE TABLE IF NOT EXISTS metric_snapshots (
            match_id   INTEGER NOT NULL,
            player_id  INTEGER NOT NULL,
            turn       INTEGER NOT NULL,
            family     TEXT NOT NULL,
            value      INTEGER NOT NULL,
            PRIMARY KEY (match_id, player_id, turn, family)
        );

        CREATE TABLE IF NOT EXISTS cities (
            match_id      INTEGER NOT NULL,
            city_id       INTEGER NOT NULL,
            name          TEXT NOT NULL,
            owner_id      INTEGER NOT NULL,
            founder_id    INTEGER NOT NULL,
            founded_turn  INTEGER,
            conquered     INTEGER NOT NULL,
            PRIMARY KEY (match_id, city_id)
        );

        CREATE TABLE IF NOT EXISTS characters (
            match_id      INTEGER NOT NULL,
            character_id  INTEGER NOT NULL,
            name          TEXT NOT NULL,
            player_id     INTEGER,
            role          TEXT,
            PRIMARY KEY (match_id, character_id)
        );

        CREATE TABLE IF NOT EXISTS bracket_matches (
            id          INTEGER PRIMARY KEY,
            round       INTEGER NOT NULL,
            player1_id  INTEGER,
            player2_id  INTEGER,
            winner_id   INTEGER
        );
        ",
    )
}
