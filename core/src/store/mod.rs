//! Embedded relational store.
//!
//! All writes go through here. A match is only ever written wholesale:
//! `replace_match` deletes the previous match and every dependent row
//! inside one transaction, then inserts the fresh rows, so a re-import
//! can never leave a half-updated match behind.

mod schema;

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use chronicle_types::{FeedMatch, FeedParticipant};

use crate::error::StoreError;
use crate::identity::normalize_name;
use crate::model::{EventFamily, EventSource, MatchEvent, OverrideRow, ParticipantRow};
use crate::save::ParsedSave;

/// One match player as seen by the link sweep.
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub match_id: i64,
    pub player_id: i64,
    pub name: String,
}

/// Row counts for status reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub matches: usize,
    pub players: usize,
    pub events: usize,
    pub participants: usize,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Matches
    // ─────────────────────────────────────────────────────────────────────────

    /// Archive hash of the stored match for `source_name`, if any.
    pub fn match_hash(&self, source_name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT archive_hash FROM matches WHERE source_name = ?1",
                params![source_name],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn match_id_by_source(&self, source_name: &str) -> Result<Option<i64>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM matches WHERE source_name = ?1",
                params![source_name],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Replace the match for `source_name` wholesale: the previous
    /// match row and all dependent rows go, the new ones come, in one
    /// transaction.
    pub fn replace_match(
        &mut self,
        source_name: &str,
        archive_hash: &str,
        parsed: &ParsedSave,
        events: &[MatchEvent],
    ) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;

        if let Some(old_id) = tx
            .query_row(
                "SELECT id FROM matches WHERE source_name = ?1",
                params![source_name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        {
            for table in [
                "match_players",
                "events",
                "metric_snapshots",
                "cities",
                "characters",
            ] {
                tx.execute(
                    &format!("DELETE FROM {table} WHERE match_id = ?1"),
                    params![old_id],
                )?;
            }
            tx.execute("DELETE FROM matches WHERE id = ?1", params![old_id])?;
        }

        tx.execute(
            "INSERT INTO matches (source_name, archive_hash, turns, ingested_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                source_name,
                archive_hash,
                parsed.turns,
                Utc::now().to_rfc3339()
            ],
        )?;
        let match_id = tx.last_insert_rowid();

        for player in &parsed.players {
            tx.execute(
                "INSERT INTO match_players (match_id, player_id, name, nation, participant_id)
                 VALUES (?1, ?2, ?3, ?4, NULL)",
                params![match_id, player.player_id, player.name, player.nation],
            )?;
        }

        for event in events {
            tx.execute(
                "INSERT INTO events (match_id, turn, family, player_id, payload, source, text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    match_id,
                    event.turn,
                    event.family.as_str(),
                    event.player_id,
                    serde_json::to_string(&event.payload)?,
                    event.source.as_str(),
                    event.text,
                ],
            )?;
        }

        for metric in &parsed.metrics {
            tx.execute(
                "INSERT INTO metric_snapshots (match_id, player_id, turn, family, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    match_id,
                    metric.player_id,
                    metric.turn,
                    metric.family,
                    metric.value
                ],
            )?;
        }

        for city in &parsed.cities {
            tx.execute(
                "INSERT INTO cities
                 (match_id, city_id, name, owner_id, founder_id, founded_turn, conquered)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    match_id,
                    city.city_id,
                    city.name,
                    city.owner_id,
                    city.founder_id,
                    city.founded_turn,
                    city.conquered(),
                ],
            )?;
        }

        for character in &parsed.characters {
            tx.execute(
                "INSERT INTO characters (match_id, character_id, name, player_id, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    match_id,
                    character.character_id,
                    character.name,
                    character.player_id,
                    character.role
                ],
            )?;
        }

        tx.commit()?;
        Ok(match_id)
    }

    /// Stored events for one match, in stored (normalized) order.
    pub fn events(&self, match_id: i64) -> Result<Vec<MatchEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT turn, family, player_id, payload, source, text
             FROM events WHERE match_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![match_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (turn, family, player_id, payload, source, text) = row?;
            let family =
                EventFamily::parse(&family).ok_or(StoreError::UnknownFamily(family))?;
            let source = match source.as_str() {
                "turn-log" => EventSource::TurnLog,
                _ => EventSource::Memory,
            };
            events.push(MatchEvent {
                turn,
                family,
                player_id,
                payload: serde_json::from_str(&payload)?,
                text,
                source,
            });
        }
        Ok(events)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Participants and overrides
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or refresh the participant registry from feed records.
    /// Normalized names are computed here, at the single write point.
    pub fn upsert_participants(
        &mut self,
        participants: &[FeedParticipant],
    ) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        for p in participants {
            tx.execute(
                "INSERT INTO tournament_participants (id, display_name, normalized_name, seed)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     display_name = excluded.display_name,
                     normalized_name = excluded.normalized_name,
                     seed = excluded.seed",
                params![p.id, p.display_name, normalize_name(&p.display_name), p.seed],
            )?;
        }
        tx.commit()?;
        Ok(participants.len())
    }

    pub fn participants(&self) -> Result<Vec<ParticipantRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name, normalized_name, seed
             FROM tournament_participants ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ParticipantRow {
                id: row.get(0)?,
                display_name: row.get(1)?,
                normalized_name: row.get(2)?,
                seed: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn upsert_bracket_matches(&mut self, matches: &[FeedMatch]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        for m in matches {
            tx.execute(
                "INSERT INTO bracket_matches (id, round, player1_id, player2_id, winner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     round = excluded.round,
                     player1_id = excluded.player1_id,
                     player2_id = excluded.player2_id,
                     winner_id = excluded.winner_id",
                params![m.id, m.round, m.player1_id, m.player2_id, m.winner_id],
            )?;
        }
        tx.commit()?;
        Ok(matches.len())
    }

    pub fn add_override(&self, row: &OverrideRow) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO participant_name_overrides (match_id, raw_name, participant_id, reason)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(match_id, raw_name) DO UPDATE SET
                 participant_id = excluded.participant_id,
                 reason = excluded.reason",
            params![row.match_id, row.raw_name, row.participant_id, row.reason],
        )?;
        Ok(())
    }

    pub fn overrides(&self) -> Result<Vec<OverrideRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, raw_name, participant_id, reason
             FROM participant_name_overrides",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(OverrideRow {
                match_id: row.get(0)?,
                raw_name: row.get(1)?,
                participant_id: row.get(2)?,
                reason: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Link sweep support
    // ─────────────────────────────────────────────────────────────────────────

    pub fn match_players_all(&self) -> Result<Vec<LinkCandidate>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT match_id, player_id, name
             FROM match_players ORDER BY match_id, player_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LinkCandidate {
                match_id: row.get(0)?,
                player_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn set_participant(
        &self,
        match_id: i64,
        player_id: i64,
        participant_id: i64,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE match_players SET participant_id = ?3
             WHERE match_id = ?1 AND player_id = ?2",
            params![match_id, player_id, participant_id],
        )?;
        Ok(())
    }

    pub fn clear_participant(&self, match_id: i64, player_id: i64) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE match_players SET participant_id = NULL
             WHERE match_id = ?1 AND player_id = ?2",
            params![match_id, player_id],
        )?;
        Ok(())
    }

    pub fn participant_of(
        &self,
        match_id: i64,
        player_id: i64,
    ) -> Result<Option<i64>, StoreError> {
        Ok(self.conn.query_row(
            "SELECT participant_id FROM match_players
             WHERE match_id = ?1 AND player_id = ?2",
            params![match_id, player_id],
            |row| row.get(0),
        )?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Status
    // ─────────────────────────────────────────────────────────────────────────

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = |sql: &str| -> Result<usize, StoreError> {
            Ok(self
                .conn
                .query_row(sql, [], |row| row.get::<_, i64>(0))? as usize)
        };
        Ok(StoreStats {
            matches: count("SELECT COUNT(*) FROM matches")?,
            players: count("SELECT COUNT(*) FROM match_players")?,
            events: count("SELECT COUNT(*) FROM events")?,
            participants: count("SELECT COUNT(*) FROM tournament_participants")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::parse_save;

    fn sample_save() -> ParsedSave {
        parse_save(
            r#"
            <GameRoot Turn="20">
              <Player ID="0" Name="Ninja [OW]">
                <LogList>
                  <LogData Type="LOG_TECH" Turn="10" Data1="TECH_NAVIGATION"/>
                </LogList>
              </Player>
              <Player ID="1" Name="Samurai"/>
              <City ID="3" Player="1" Founder="0" Name="Nebet"/>
            </GameRoot>
            "#,
        )
        .expect("fixture should parse")
    }

    #[test]
    fn replace_match_is_wholesale() {
        let mut store = Store::open_in_memory().expect("open");
        let parsed = sample_save();
        let events = crate::normalize::normalize_events(parsed.turn_log.clone(), Vec::new());

        let first_id = store
            .replace_match("round1.zip", "hash-a", &parsed, &events)
            .expect("insert");
        assert_eq!(store.match_hash("round1.zip").unwrap().as_deref(), Some("hash-a"));

        // Re-import with a new hash replaces everything, including ids.
        let second_id = store
            .replace_match("round1.zip", "hash-b", &parsed, &events)
            .expect("replace");
        assert_ne!(first_id, second_id);
        assert_eq!(store.match_hash("round1.zip").unwrap().as_deref(), Some("hash-b"));

        let stats = store.stats().expect("stats");
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.players, 2);
        assert_eq!(stats.events, 1);
    }

    #[test]
    fn events_round_trip_in_stored_order() {
        let mut store = Store::open_in_memory().expect("open");
        let parsed = sample_save();
        let events = crate::normalize::normalize_events(
            parsed.turn_log.clone(),
            parsed.memory.clone(),
        );
        let match_id = store
            .replace_match("round1.zip", "hash-a", &parsed, &events)
            .expect("insert");

        let stored = store.events(match_id).expect("events");
        assert_eq!(stored, events);
    }

    #[test]
    fn participant_upsert_refreshes_in_place() {
        let mut store = Store::open_in_memory().expect("open");
        store
            .upsert_participants(&[FeedParticipant {
                id: 7,
                display_name: "Ninja".to_string(),
                seed: Some(1),
            }])
            .expect("insert");
        store
            .upsert_participants(&[FeedParticipant {
                id: 7,
                display_name: "Nïnja".to_string(),
                seed: Some(2),
            }])
            .expect("update");

        let participants = store.participants().expect("list");
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].display_name, "Nïnja");
        assert_eq!(participants[0].normalized_name, "ninja");
        assert_eq!(participants[0].seed, Some(2));
    }

    #[test]
    fn override_upsert_replaces_reason() {
        let store = Store::open_in_memory().expect("open");
        let mut row = OverrideRow {
            match_id: 1,
            raw_name: "Ninja".to_string(),
            participant_id: 7,
            reason: "first".to_string(),
        };
        store.add_override(&row).expect("insert");
        row.reason = "second".to_string();
        store.add_override(&row).expect("upsert");

        let overrides = store.overrides().expect("list");
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].reason, "second");
    }
}
