//! Merging the two raw streams into one deduplicated event log.
//!
//! Dedup key: (turn, family, owning player). When both streams record
//! the same fact under one key, exactly one survives:
//! - a structured payload beats a text-only one,
//! - otherwise the turn-log variant beats the memory variant.
//!
//! The second rule is a deliberate fixed tie-break, encoded in
//! `EventSource`'s ordering rather than left to traversal order, so the
//! result is identical no matter which stream is folded in first.
//!
//! The final sequence is sorted by (turn, owning player, per-family
//! priority); repeated runs over unchanged input yield byte-identical
//! ordering.

use hashbrown::HashMap;

use crate::model::{EventFamily, MatchEvent};
use crate::save::sort_priority;

type DedupKey = (i64, EventFamily, Option<i64>);

/// Merge, deduplicate, and deterministically order the two raw streams
/// of one match.
pub fn normalize_events(turn_log: Vec<MatchEvent>, memory: Vec<MatchEvent>) -> Vec<MatchEvent> {
    let mut merged: HashMap<DedupKey, MatchEvent> =
        HashMap::with_capacity(turn_log.len() + memory.len());

    for event in turn_log.into_iter().chain(memory) {
        let key = (event.turn, event.family, event.player_id);
        match merged.get_mut(&key) {
            Some(kept) => {
                if beats(&event, kept) {
                    *kept = event;
                }
            }
            None => {
                merged.insert(key, event);
            }
        }
    }

    let mut events: Vec<MatchEvent> = merged.into_values().collect();
    events.sort_by_key(|e| (e.turn, e.player_id, sort_priority(e.family)));
    events
}

/// Whether `challenger` should replace the already-kept variant for the
/// same dedup key.
fn beats(challenger: &MatchEvent, kept: &MatchEvent) -> bool {
    match (
        challenger.has_structured_payload(),
        kept.has_structured_payload(),
    ) {
        (true, false) => true,
        (false, true) => false,
        // Same payload completeness: the fixed source priority decides.
        _ => challenger.source < kept.source,
    }
}
