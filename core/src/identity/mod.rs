//! Cross-match participant identity.
//!
//! Maps each match-scoped player slot to a tournament-wide persistent
//! participant. Resolution is override-first, then an exact lookup in
//! the normalized-name index, never a guess: an unknown name resolves
//! to nothing and is reported for a human to add an override.

mod name;

use std::collections::BTreeMap;

use hashbrown::HashMap;
use tracing::{debug, info};

use chronicle_types::{LinkReport, UnmatchedNames};

use crate::error::StoreError;
use crate::model::{OverrideRow, ParticipantRow};
use crate::store::Store;

pub use name::normalize_name;

/// Immutable normalized-name -> participant-id index, built once per
/// batch run from the full participant registry and read-only after.
#[derive(Debug, Default)]
pub struct NameIndex {
    map: HashMap<String, i64>,
}

impl NameIndex {
    pub fn build(participants: &[ParticipantRow]) -> Self {
        let mut map = HashMap::with_capacity(participants.len());
        for participant in participants {
            map.insert(participant.normalized_name.clone(), participant.id);
        }
        Self { map }
    }

    pub fn lookup(&self, raw_name: &str) -> Option<i64> {
        self.map.get(&normalize_name(raw_name)).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Resolves match players against the index and the manual overrides.
pub struct ParticipantMatcher<'a> {
    index: &'a NameIndex,
    overrides: HashMap<(i64, String), i64>,
}

impl<'a> ParticipantMatcher<'a> {
    pub fn new(index: &'a NameIndex, overrides: Vec<OverrideRow>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|o| ((o.match_id, o.raw_name), o.participant_id))
            .collect();
        Self { index, overrides }
    }

    /// Resolve one (match, raw name) pair. Overrides always win;
    /// otherwise exact normalized lookup; otherwise `None`.
    pub fn resolve(&self, match_id: i64, raw_name: &str) -> Option<i64> {
        if let Some(&id) = self.overrides.get(&(match_id, raw_name.to_string())) {
            return Some(id);
        }
        self.index.lookup(raw_name)
    }

    /// Sweep every committed match player, write back resolved
    /// participant ids, and report the rest. Never fails on unmatched
    /// input.
    pub fn link_all(&self, store: &Store) -> Result<LinkReport, StoreError> {
        let mut report = LinkReport::default();
        let mut unmatched: BTreeMap<i64, Vec<String>> = BTreeMap::new();

        for candidate in store.match_players_all()? {
            report.considered += 1;
            match self.resolve(candidate.match_id, &candidate.name) {
                Some(participant_id) => {
                    store.set_participant(
                        candidate.match_id,
                        candidate.player_id,
                        participant_id,
                    )?;
                    report.matched += 1;
                }
                None => {
                    debug!(
                        match_id = candidate.match_id,
                        name = %candidate.name,
                        "no participant match"
                    );
                    store.clear_participant(candidate.match_id, candidate.player_id)?;
                    report.unmatched += 1;
                    unmatched
                        .entry(candidate.match_id)
                        .or_default()
                        .push(candidate.name);
                }
            }
        }

        report.unmatched_detail = unmatched
            .into_iter()
            .map(|(match_id, names)| UnmatchedNames { match_id, names })
            .collect();

        info!(
            considered = report.considered,
            matched = report.matched,
            unmatched = report.unmatched,
            "participant link sweep complete"
        );
        Ok(report)
    }
}
