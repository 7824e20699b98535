//! Event family registration.
//!
//! Three fixed tables drive all per-family behavior:
//! - tag -> family maps for the two record streams,
//! - a family -> payload extractor table for turn-log records,
//! - a family -> sort priority table used as the final ordering
//!   tie-break.
//!
//! A new family is added by extending these tables and the
//! [`EventFamily`] enum; nothing in the dispatch paths changes.

use phf::phf_map;
use serde_json::{Map, Value};

use super::document::{LogRecord, MemoryRecord};
use crate::model::EventFamily;

/// Turn-log type tags.
pub static LOG_TAGS: phf::Map<&'static str, EventFamily> = phf_map! {
    "LOG_LAW" => EventFamily::LawAdopted,
    "LOG_TECH" => EventFamily::TechDiscovered,
    "LOG_CITY_FOUNDED" => EventFamily::CityFounded,
    "LOG_CITY_CAPTURED" => EventFamily::CityCaptured,
    "LOG_WAR" => EventFamily::WarDeclared,
    "LOG_PEACE" => EventFamily::PeaceMade,
    "LOG_SUCCESSION" => EventFamily::RulerSucceeded,
    "LOG_GOAL_FINISHED" => EventFamily::GoalFinished,
};

/// Memory type tags that describe the same facts the turn-log records.
/// These land on the shared family so normalization can deduplicate
/// the two streams against each other.
static MEMORY_SHARED_TAGS: phf::Map<&'static str, EventFamily> = phf_map! {
    "MEMORYPLAYER_DECLARED_WAR" => EventFamily::WarDeclared,
    "MEMORYPLAYER_MADE_PEACE" => EventFamily::PeaceMade,
    "MEMORYPLAYER_CAPTURED_CITY" => EventFamily::CityCaptured,
    "MEMORYPLAYER_ADOPTED_LAW" => EventFamily::LawAdopted,
};

/// Resolve a memory record's type tag to its family.
///
/// Tags without a dedicated mapping fall back to the generic memory
/// families by prefix; unknown prefixes are not events at all.
pub fn memory_family(tag: &str) -> Option<EventFamily> {
    if let Some(family) = MEMORY_SHARED_TAGS.get(tag) {
        return Some(*family);
    }
    if tag.starts_with("MEMORYPLAYER_") {
        Some(EventFamily::MemoryPlayer)
    } else if tag.starts_with("MEMORYTRIBE_") {
        Some(EventFamily::MemoryTribe)
    } else {
        None
    }
}

type LogPayloadFn = fn(&LogRecord) -> Value;

/// Registered payload extractors for turn-log families. Families
/// without an entry (the memory-only ones) produce an empty payload.
static LOG_EXTRACTORS: &[(EventFamily, LogPayloadFn)] = &[
    (EventFamily::LawAdopted, law_payload),
    (EventFamily::TechDiscovered, tech_payload),
    (EventFamily::CityFounded, city_founded_payload),
    (EventFamily::CityCaptured, city_captured_payload),
    (EventFamily::WarDeclared, war_payload),
    (EventFamily::PeaceMade, peace_payload),
    (EventFamily::RulerSucceeded, succession_payload),
    (EventFamily::GoalFinished, goal_payload),
];

/// Extract the structured payload for a turn-log record.
pub fn log_payload(family: EventFamily, record: &LogRecord) -> Value {
    LOG_EXTRACTORS
        .iter()
        .find(|(f, _)| *f == family)
        .map(|(_, extract)| extract(record))
        .unwrap_or_else(empty_payload)
}

/// Extract the structured payload for a memory record.
///
/// Memory records mapped onto a shared family carry no structure of
/// their own; the turn-log side is the structured variant there.
pub fn memory_payload(family: EventFamily, tag: &str, record: &MemoryRecord) -> Value {
    match family {
        EventFamily::MemoryPlayer => {
            object(&[("kind", Some(memory_kind(tag)))])
        }
        EventFamily::MemoryTribe => object(&[
            ("kind", Some(memory_kind(tag))),
            ("tribe", record.tribe.as_deref()),
        ]),
        _ => empty_payload(),
    }
}

/// Fixed per-family ordering priority, the last component of the
/// normalized sort key. Lower sorts first.
pub fn sort_priority(family: EventFamily) -> u8 {
    match family {
        EventFamily::WarDeclared => 0,
        EventFamily::PeaceMade => 1,
        EventFamily::CityFounded => 2,
        EventFamily::CityCaptured => 3,
        EventFamily::LawAdopted => 4,
        EventFamily::TechDiscovered => 5,
        EventFamily::RulerSucceeded => 6,
        EventFamily::GoalFinished => 7,
        EventFamily::MemoryPlayer => 8,
        EventFamily::MemoryTribe => 9,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractors
// ─────────────────────────────────────────────────────────────────────────────

fn law_payload(record: &LogRecord) -> Value {
    object(&[("law", record.data1.as_deref())])
}

fn tech_payload(record: &LogRecord) -> Value {
    object(&[("tech", record.data1.as_deref())])
}

fn city_founded_payload(record: &LogRecord) -> Value {
    object(&[("city", record.data1.as_deref())])
}

fn city_captured_payload(record: &LogRecord) -> Value {
    object(&[
        ("city", record.data1.as_deref()),
        ("taken_from", record.data2.as_deref()),
    ])
}

fn war_payload(record: &LogRecord) -> Value {
    object(&[("against", record.data1.as_deref())])
}

fn peace_payload(record: &LogRecord) -> Value {
    object(&[("with", record.data1.as_deref())])
}

fn succession_payload(record: &LogRecord) -> Value {
    object(&[
        ("ruler", record.data1.as_deref()),
        ("predecessor", record.data2.as_deref()),
    ])
}

fn goal_payload(record: &LogRecord) -> Value {
    object(&[("goal", record.data1.as_deref())])
}

/// Tag suffix past the family prefix, e.g.
/// `MEMORYPLAYER_ATTACKED_UNIT` -> `ATTACKED_UNIT`.
fn memory_kind(tag: &str) -> &str {
    tag.strip_prefix("MEMORYPLAYER_")
        .or_else(|| tag.strip_prefix("MEMORYTRIBE_"))
        .unwrap_or(tag)
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

/// Build a JSON object from the present fields only, so a record with
/// no data attributes yields an empty (unstructured) payload.
fn object(fields: &[(&str, Option<&str>)]) -> Value {
    let mut map = Map::new();
    for (key, value) in fields {
        if let Some(value) = value {
            map.insert((*key).to_string(), Value::String((*value).to_string()));
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_record(kind: &str, data1: Option<&str>) -> LogRecord {
        LogRecord {
            kind: Some(kind.to_string()),
            turn: Some(1),
            data1: data1.map(str::to_string),
            data2: None,
            data3: None,
            text: None,
        }
    }

    #[test]
    fn log_tags_resolve_to_their_families() {
        assert_eq!(LOG_TAGS.get("LOG_LAW"), Some(&EventFamily::LawAdopted));
        assert_eq!(LOG_TAGS.get("LOG_TECH"), Some(&EventFamily::TechDiscovered));
        assert_eq!(
            LOG_TAGS.get("LOG_CITY_CAPTURED"),
            Some(&EventFamily::CityCaptured)
        );
        assert!(LOG_TAGS.get("LOG_UNKNOWN").is_none());
    }

    #[test]
    fn shared_memory_tags_land_on_log_families() {
        assert_eq!(
            memory_family("MEMORYPLAYER_DECLARED_WAR"),
            Some(EventFamily::WarDeclared)
        );
        assert_eq!(
            memory_family("MEMORYPLAYER_ADOPTED_LAW"),
            Some(EventFamily::LawAdopted)
        );
    }

    #[test]
    fn unshared_memory_tags_fall_back_by_prefix() {
        assert_eq!(
            memory_family("MEMORYPLAYER_ATTACKED_UNIT"),
            Some(EventFamily::MemoryPlayer)
        );
        assert_eq!(
            memory_family("MEMORYTRIBE_RAIDED"),
            Some(EventFamily::MemoryTribe)
        );
        assert_eq!(memory_family("MEMORYRELIGION_FOUNDED"), None);
    }

    #[test]
    fn law_extractor_reads_first_data_field() {
        let payload = log_payload(
            EventFamily::LawAdopted,
            &log_record("LOG_LAW", Some("LAW_SLAVERY")),
        );
        assert_eq!(payload["law"], "LAW_SLAVERY");
    }

    #[test]
    fn extractor_omits_absent_fields() {
        let payload = log_payload(EventFamily::LawAdopted, &log_record("LOG_LAW", None));
        assert_eq!(payload, serde_json::json!({}));
    }

    #[test]
    fn memory_payload_keeps_kind_and_tribe() {
        let record = MemoryRecord {
            kind: Some("MEMORYTRIBE_RAIDED".to_string()),
            turn: Some(5),
            subject: None,
            tribe: Some("TRIBE_GAULS".to_string()),
            text: None,
        };
        let payload = memory_payload(EventFamily::MemoryTribe, "MEMORYTRIBE_RAIDED", &record);
        assert_eq!(payload["kind"], "RAIDED");
        assert_eq!(payload["tribe"], "TRIBE_GAULS");
    }

    #[test]
    fn priorities_are_distinct() {
        let all = [
            EventFamily::LawAdopted,
            EventFamily::TechDiscovered,
            EventFamily::CityFounded,
            EventFamily::CityCaptured,
            EventFamily::WarDeclared,
            EventFamily::PeaceMade,
            EventFamily::RulerSucceeded,
            EventFamily::GoalFinished,
            EventFamily::MemoryTribe,
            EventFamily::MemoryPlayer,
        ];
        let mut priorities: Vec<u8> = all.iter().map(|f| sort_priority(*f)).collect();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), all.len());
    }
}
