//! Shared data model for the ingestion pipeline.
//!
//! Player id convention, applied everywhere: the save format uses
//! 0-based player ids; every stored id is that value plus one. The
//! offset is applied exactly once, at extraction (`save::extract`),
//! and all downstream code only ever sees converted ids.

use serde::{Deserialize, Serialize};

/// Closed set of event families the pipeline understands.
///
/// Adding a family means adding a variant here plus its tag mapping and
/// payload extractor in `save::families`; dispatch for existing
/// families is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFamily {
    LawAdopted,
    TechDiscovered,
    CityFounded,
    CityCaptured,
    WarDeclared,
    PeaceMade,
    RulerSucceeded,
    GoalFinished,
    MemoryTribe,
    MemoryPlayer,
}

impl EventFamily {
    /// Stable storage identifier for this family.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LawAdopted => "law-adopted",
            Self::TechDiscovered => "tech-discovered",
            Self::CityFounded => "city-founded",
            Self::CityCaptured => "city-captured",
            Self::WarDeclared => "war-declared",
            Self::PeaceMade => "peace-made",
            Self::RulerSucceeded => "ruler-succeeded",
            Self::GoalFinished => "goal-finished",
            Self::MemoryTribe => "memory-tribe",
            Self::MemoryPlayer => "memory-player",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "law-adopted" => Self::LawAdopted,
            "tech-discovered" => Self::TechDiscovered,
            "city-founded" => Self::CityFounded,
            "city-captured" => Self::CityCaptured,
            "war-declared" => Self::WarDeclared,
            "peace-made" => Self::PeaceMade,
            "ruler-succeeded" => Self::RulerSucceeded,
            "goal-finished" => Self::GoalFinished,
            "memory-tribe" => Self::MemoryTribe,
            "memory-player" => Self::MemoryPlayer,
            _ => return None,
        })
    }
}

/// Which of the two raw streams produced an event.
///
/// `Ord` encodes the dedup tie-break: when both streams carry a
/// structured payload for the same key, the lower source wins, so the
/// turn-log variant is kept over the memory variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSource {
    TurnLog,
    Memory,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnLog => "turn-log",
            Self::Memory => "memory",
        }
    }
}

/// One typed, turn-stamped fact extracted from a save document.
///
/// Used both for the raw per-stream records and for the normalized
/// output; normalization only merges and orders, it never reshapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub turn: i64,
    pub family: EventFamily,
    /// Stored (1-based) owning player id; `None` only for genuinely
    /// global events.
    pub player_id: Option<i64>,
    /// Family-specific structured payload; an empty object when the
    /// record carried nothing beyond its free-form text.
    pub payload: serde_json::Value,
    /// Raw descriptive text from the source record.
    pub text: String,
    pub source: EventSource,
}

impl MatchEvent {
    /// True when the payload carries structured data, not just text.
    pub fn has_structured_payload(&self) -> bool {
        self.payload.as_object().is_some_and(|o| !o.is_empty())
    }
}

/// A player slot scoped to one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlayerRow {
    /// Match-local id, already offset-converted (1-based).
    pub player_id: i64,
    pub name: String,
    pub nation: Option<String>,
    /// Resolved tournament participant, filled in by the link sweep.
    pub participant_id: Option<i64>,
}

/// A city extracted from the save. Founder and owner differ for
/// conquered cities; that difference is meaningful, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRow {
    pub city_id: i64,
    pub name: String,
    /// Current owner, offset-converted.
    pub owner_id: i64,
    /// Original founder, offset-converted.
    pub founder_id: i64,
    pub founded_turn: Option<i64>,
}

impl CityRow {
    pub fn conquered(&self) -> bool {
        self.owner_id != self.founder_id
    }
}

/// A ruler or notable character extracted from the save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRow {
    pub character_id: i64,
    pub name: String,
    /// Owning player, offset-converted; `None` for unaligned characters.
    pub player_id: Option<i64>,
    pub role: Option<String>,
}

/// One per-turn metric sample. Not deduplicated: each source turn
/// produces exactly one row per (player, family).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshotRow {
    pub player_id: i64,
    pub turn: i64,
    /// Metric family, e.g. `STAT_POINTS`; per-entity metrics fold their
    /// subject into the family as `STAT_OPINION:<stored-id>`.
    pub family: String,
    pub value: i64,
}

/// A persistent tournament participant as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub id: i64,
    pub display_name: String,
    pub normalized_name: String,
    pub seed: Option<i64>,
}

/// A manual (match, raw name) -> participant mapping. Human-created,
/// always wins over automatic matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRow {
    pub match_id: i64,
    pub raw_name: String,
    pub participant_id: i64,
    pub reason: String,
}
