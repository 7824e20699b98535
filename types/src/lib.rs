//! Shared plain-data types for Chronicle.
//!
//! Everything here is serde-serializable and dependency-light so both
//! the core pipeline and any front end (CLI today) can exchange reports
//! and feed records without pulling in the pipeline itself.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Tournament feed records (Input B)
// ─────────────────────────────────────────────────────────────────────────────

/// A persistent tournament participant as supplied by the bracket feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedParticipant {
    pub id: i64,
    pub display_name: String,
    pub seed: Option<i64>,
}

/// A bracket match as supplied by the feed. Participant ids refer to
/// [`FeedParticipant::id`]; `winner_id` is absent for unplayed matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMatch {
    pub id: i64,
    pub round: i64,
    pub player1_id: Option<i64>,
    pub player2_id: Option<i64>,
    pub winner_id: Option<i64>,
}

/// The complete, already-deserialized bracket feed. The transport client
/// that produces this lives outside the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentFeed {
    pub participants: Vec<FeedParticipant>,
    pub matches: Vec<FeedMatch>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Run reports
// ─────────────────────────────────────────────────────────────────────────────

/// One failed source archive in a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceError {
    /// File name or path of the archive that failed.
    pub source: String,
    pub message: String,
}

/// Outcome of one orchestrator batch run.
///
/// Every archive in the batch lands in exactly one bucket; `errors`
/// enumerates each failure so a run never reports silent partial success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<SourceError>,
    /// Result of the end-of-batch participant link sweep; `None` when
    /// the participant registry was empty and the sweep was skipped.
    pub link: Option<LinkReport>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Match players that could not be resolved, grouped per match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedNames {
    pub match_id: i64,
    pub names: Vec<String>,
}

/// Outcome of a participant-linking sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub considered: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub unmatched_detail: Vec<UnmatchedNames>,
}

impl LinkReport {
    /// Fraction of considered players that resolved, in [0, 1].
    pub fn match_rate(&self) -> f64 {
        if self.considered == 0 {
            return 0.0;
        }
        self.matched as f64 / self.considered as f64
    }
}

/// Outcome of persisting a bracket feed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketSyncReport {
    pub participants: usize,
    pub matches: usize,
}
