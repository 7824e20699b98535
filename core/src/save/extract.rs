//! Raw stream and entity extraction from a parsed save document.
//!
//! Two independent passes over the same document: the turn-log pass and
//! the memory pass. Both walk player sections top-down and carry the
//! enclosing section's owner as context, because the source format has
//! no explicit ownership key on the records themselves.
//!
//! Ownership contract for memory records: an explicit subject-player
//! attribute wins; otherwise the record belongs to the enclosing
//! section's owner. A record's owner is never left unset.

use tracing::{debug, warn};

use super::document::{SaveDocument, parse_document};
use super::families::{LOG_TAGS, log_payload, memory_family, memory_payload};
use crate::error::ParseError;
use crate::model::{
    CharacterRow, CityRow, EventSource, MatchEvent, MatchPlayerRow, MetricSnapshotRow,
};

/// Everything extracted from one save document: the two raw event
/// streams plus the auxiliary entity tables.
#[derive(Debug, Default)]
pub struct ParsedSave {
    /// Final turn of the session.
    pub turns: i64,
    pub players: Vec<MatchPlayerRow>,
    /// Raw turn-log stream, owner = enclosing section, in document order.
    pub turn_log: Vec<MatchEvent>,
    /// Raw memory stream, owner = explicit subject or enclosing section.
    pub memory: Vec<MatchEvent>,
    pub cities: Vec<CityRow>,
    pub characters: Vec<CharacterRow>,
    pub metrics: Vec<MetricSnapshotRow>,
    /// Records dropped for missing required fields or unknown type tags.
    pub skipped_records: usize,
}

/// Parse and extract one save document.
pub fn parse_save(xml: &str) -> Result<ParsedSave, ParseError> {
    Ok(extract(&parse_document(xml)?))
}

/// Convert a 0-based source player id to its stored 1-based id.
///
/// This is the only place the offset is applied; everything downstream
/// works with converted ids exclusively.
fn stored_id(source: i64) -> i64 {
    source + 1
}

fn extract(doc: &SaveDocument) -> ParsedSave {
    let mut out = ParsedSave {
        turns: doc.turn,
        ..ParsedSave::default()
    };

    for section in &doc.players {
        let owner = stored_id(section.id);

        out.players.push(MatchPlayerRow {
            player_id: owner,
            name: section.name.clone(),
            nation: section.nation.clone(),
            participant_id: None,
        });

        extract_turn_log(&mut out, section, owner);
        extract_memory(&mut out, section, owner);
        extract_metrics(&mut out, section, owner);
    }

    for city in &doc.cities {
        out.cities.push(CityRow {
            city_id: city.id,
            name: city.name.clone(),
            owner_id: stored_id(city.player),
            founder_id: stored_id(city.founder),
            founded_turn: city.founded_turn,
        });
    }

    for character in &doc.characters {
        out.characters.push(CharacterRow {
            character_id: character.id,
            name: character.name.clone(),
            player_id: character.player.map(stored_id),
            role: character.role.clone(),
        });
    }

    out
}

fn extract_turn_log(
    out: &mut ParsedSave,
    section: &super::document::PlayerSection,
    owner: i64,
) {
    for record in &section.log_list.records {
        let (Some(tag), Some(turn)) = (record.kind.as_deref(), record.turn) else {
            out.skipped_records += 1;
            warn!(owner, "turn-log record missing type or turn, skipping");
            continue;
        };
        let Some(&family) = LOG_TAGS.get(tag) else {
            out.skipped_records += 1;
            debug!(owner, tag, "unknown turn-log type tag, skipping");
            continue;
        };
        out.turn_log.push(MatchEvent {
            turn,
            family,
            // Ownership comes from the enclosing section, never from
            // the data fields.
            player_id: Some(owner),
            payload: log_payload(family, record),
            text: record.text.clone().unwrap_or_default(),
            source: EventSource::TurnLog,
        });
    }
}

fn extract_memory(out: &mut ParsedSave, section: &super::document::PlayerSection, owner: i64) {
    for record in &section.memory_list.records {
        let (Some(tag), Some(turn)) = (record.kind.as_deref(), record.turn) else {
            out.skipped_records += 1;
            warn!(owner, "memory record missing type or turn, skipping");
            continue;
        };
        let Some(family) = memory_family(tag) else {
            out.skipped_records += 1;
            debug!(owner, tag, "unknown memory type tag, skipping");
            continue;
        };
        // Explicit subject wins; otherwise the enclosing owner.
        let player_id = record.subject.map(stored_id).unwrap_or(owner);
        out.memory.push(MatchEvent {
            turn,
            family,
            player_id: Some(player_id),
            payload: memory_payload(family, tag, record),
            text: record.text.clone().unwrap_or_default(),
            source: EventSource::Memory,
        });
    }
}

fn extract_metrics(out: &mut ParsedSave, section: &super::document::PlayerSection, owner: i64) {
    for record in &section.stat_list.records {
        let (Some(kind), Some(turn)) = (record.kind.as_deref(), record.turn) else {
            out.skipped_records += 1;
            warn!(owner, "stat record missing type or turn, skipping");
            continue;
        };
        // Per-entity metrics fold their target into the family so the
        // (player, turn, family) key stays unique per subject.
        let family = match record.target {
            Some(target) => format!("{kind}:{}", stored_id(target)),
            None => kind.to_string(),
        };
        out.metrics.push(MetricSnapshotRow {
            player_id: owner,
            turn,
            family,
            value: record.value,
        });
    }
}
