//! Batch orchestration: read -> parse -> normalize -> upsert, one
//! archive at a time, then a single participant-link sweep.
//!
//! Per-archive failures are caught, counted, and reported; the batch
//! always runs to completion. The whole run is re-runnable: a match is
//! only rewritten when its archive hash changed (or `force` is set),
//! and each rewrite is a self-contained replace, so interrupting a
//! batch never leaves a half-written match.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use chronicle_types::{BracketSyncReport, IngestReport, LinkReport, SourceError, TournamentFeed};

use crate::archive::{SaveArchive, read_archive};
use crate::error::{IngestError, StoreError};
use crate::identity::{NameIndex, ParticipantMatcher};
use crate::normalize::normalize_events;
use crate::save::parse_save;
use crate::store::Store;

/// Drives the whole pipeline against one store.
pub struct Ingestor {
    store: Store,
}

/// What happened to one archive in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    Skipped,
}

impl Ingestor {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Ingest a batch of archives. Fails only when there is nothing to
    /// ingest at all; everything else is per-archive and reported.
    pub fn run(&mut self, sources: &[PathBuf], force: bool) -> Result<IngestReport, IngestError> {
        if sources.is_empty() {
            return Err(IngestError::NoSources);
        }

        let mut report = IngestReport::default();
        for path in sources {
            match self.ingest_one(path, force) {
                Ok(Outcome::Processed) => report.processed += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "archive failed, continuing batch");
                    report.failed += 1;
                    report.errors.push(SourceError {
                        source: path.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.link = if self.store.participants()?.is_empty() {
            warn!("participant registry is empty, skipping link sweep");
            None
        } else {
            Some(self.link_participants()?)
        };

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "ingest batch complete"
        );
        Ok(report)
    }

    fn ingest_one(&mut self, path: &Path, force: bool) -> Result<Outcome, IngestError> {
        self.ingest_archive(read_archive(path)?, force)
    }

    /// Commit one already-read archive. Exposed for callers that hold
    /// archive bytes rather than paths.
    pub fn ingest_archive(
        &mut self,
        archive: SaveArchive,
        force: bool,
    ) -> Result<Outcome, IngestError> {
        if !force
            && self.store.match_hash(&archive.name)?.as_deref() == Some(&*archive.content_hash)
        {
            info!(source = %archive.name, "archive unchanged, skipping");
            return Ok(Outcome::Skipped);
        }

        let parsed = parse_save(&archive.xml)?;
        if parsed.skipped_records > 0 {
            warn!(
                source = %archive.name,
                skipped = parsed.skipped_records,
                "incomplete records skipped during extraction"
            );
        }

        let events = normalize_events(parsed.turn_log.clone(), parsed.memory.clone());
        let match_id =
            self.store
                .replace_match(&archive.name, &archive.content_hash, &parsed, &events)?;

        info!(
            source = %archive.name,
            match_id,
            players = parsed.players.len(),
            events = events.len(),
            "match committed"
        );
        Ok(Outcome::Processed)
    }

    /// Run one participant-link sweep over all committed match players.
    /// With an empty participant registry this is a warned no-op, not a
    /// failure.
    pub fn link_participants(&mut self) -> Result<LinkReport, StoreError> {
        let participants = self.store.participants()?;
        if participants.is_empty() {
            warn!("participant registry is empty, skipping link sweep");
            return Ok(LinkReport::default());
        }

        let index = NameIndex::build(&participants);
        let matcher = ParticipantMatcher::new(&index, self.store.overrides()?);
        matcher.link_all(&self.store)
    }

    /// Persist a bracket feed snapshot: participant registry plus
    /// bracket matches. Independent of archive ingestion.
    pub fn sync_bracket(&mut self, feed: &TournamentFeed) -> Result<BracketSyncReport, StoreError> {
        let participants = self.store.upsert_participants(&feed.participants)?;
        let matches = self.store.upsert_bracket_matches(&feed.matches)?;
        info!(participants, matches, "bracket feed synced");
        Ok(BracketSyncReport {
            participants,
            matches,
        })
    }
}
