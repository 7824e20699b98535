//! End-to-end tests for the ingestion pipeline.
//!
//! Archives are built in memory; the store is in-memory sqlite. Only
//! the batch-error test touches disk, because `run` takes paths.

use std::fs;

use chronicle_types::{FeedMatch, FeedParticipant, TournamentFeed};

use crate::archive::{read_archive_bytes, zip_with_entries};
use crate::error::IngestError;
use crate::ingest::{Ingestor, Outcome};
use crate::model::{EventFamily, EventSource, OverrideRow};
use crate::store::Store;

fn ingestor() -> Ingestor {
    Ingestor::new(Store::open_in_memory().expect("in-memory store"))
}

fn archive_from(name: &str, xml: &str) -> crate::archive::SaveArchive {
    let bytes = zip_with_entries(&[("save.xml", xml)]);
    read_archive_bytes(name, &bytes).expect("fixture archive should read")
}

const TWO_PLAYER_SAVE: &str = r#"
    <GameRoot Turn="60">
      <Player ID="0" Name="Ninja [OW]">
        <MemoryList>
          <MemoryData Type="MEMORYTRIBE_RAIDED" Turn="5" Tribe="TRIBE_GAULS"/>
        </MemoryList>
      </Player>
      <Player ID="1" Name="Samurai">
        <LogList>
          <LogData Type="LOG_LAW" Turn="54" Data1="LAW_SLAVERY">Adopted Slavery</LogData>
        </LogList>
      </Player>
    </GameRoot>
"#;

#[test]
fn end_to_end_two_player_scenario() {
    let mut ingestor = ingestor();
    let outcome = ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), false)
        .expect("ingest");
    assert_eq!(outcome, Outcome::Processed);

    let match_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .expect("query")
        .expect("match exists");
    let events = ingestor.store().events(match_id).expect("events");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].turn, 5);
    assert_eq!(events[0].player_id, Some(1));
    assert_eq!(events[0].family, EventFamily::MemoryTribe);
    assert_eq!(events[1].turn, 54);
    assert_eq!(events[1].player_id, Some(2));
    assert_eq!(events[1].family, EventFamily::LawAdopted);
}

#[test]
fn cross_stream_duplicate_collapses_to_turn_log() {
    // Player 0 logs its own war declaration; player 1 remembers the
    // same fact about player 0 (explicit subject). One key, one event.
    let xml = r#"
        <GameRoot Turn="40">
          <Player ID="0" Name="Ninja">
            <LogList>
              <LogData Type="LOG_WAR" Turn="30" Data1="NATION_BABYLON"/>
            </LogList>
          </Player>
          <Player ID="1" Name="Samurai">
            <MemoryList>
              <MemoryData Type="MEMORYPLAYER_DECLARED_WAR" Turn="30" Player="0"/>
            </MemoryList>
          </Player>
        </GameRoot>
    "#;

    let mut ingestor = ingestor();
    ingestor
        .ingest_archive(archive_from("round2.zip", xml), false)
        .expect("ingest");

    let match_id = ingestor
        .store()
        .match_id_by_source("round2.zip")
        .unwrap()
        .unwrap();
    let events = ingestor.store().events(match_id).expect("events");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].family, EventFamily::WarDeclared);
    assert_eq!(events[0].player_id, Some(1));
    assert_eq!(events[0].source, EventSource::TurnLog);
    assert_eq!(events[0].payload["against"], "NATION_BABYLON");
}

#[test]
fn reingest_unchanged_archive_is_a_noop() {
    let mut ingestor = ingestor();
    let first = ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), false)
        .expect("first ingest");
    assert_eq!(first, Outcome::Processed);

    let match_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .unwrap()
        .unwrap();
    let before = ingestor.store().events(match_id).expect("events");
    let stats_before = ingestor.store().stats().expect("stats");

    let second = ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), false)
        .expect("second ingest");
    assert_eq!(second, Outcome::Skipped);

    // Identical row counts and identical event ordering.
    assert_eq!(ingestor.store().stats().expect("stats"), stats_before);
    assert_eq!(ingestor.store().events(match_id).expect("events"), before);
}

#[test]
fn forced_reingest_replaces_but_reproduces_the_same_log() {
    let mut ingestor = ingestor();
    ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), false)
        .expect("first ingest");
    let first_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .unwrap()
        .unwrap();
    let before = ingestor.store().events(first_id).expect("events");

    let forced = ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), true)
        .expect("forced ingest");
    assert_eq!(forced, Outcome::Processed);

    let second_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .unwrap()
        .unwrap();
    assert_ne!(first_id, second_id);
    assert_eq!(ingestor.store().events(second_id).expect("events"), before);
    assert_eq!(ingestor.store().stats().expect("stats").matches, 1);
}

#[test]
fn changed_archive_is_fully_replaced() {
    let mut ingestor = ingestor();
    ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), false)
        .expect("first ingest");

    let revised = r#"
        <GameRoot Turn="61">
          <Player ID="0" Name="Ninja [OW]">
            <LogList>
              <LogData Type="LOG_TECH" Turn="12" Data1="TECH_NAVIGATION"/>
            </LogList>
          </Player>
        </GameRoot>
    "#;
    let outcome = ingestor
        .ingest_archive(archive_from("round1.zip", revised), false)
        .expect("revised ingest");
    assert_eq!(outcome, Outcome::Processed);

    let match_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .unwrap()
        .unwrap();
    let events = ingestor.store().events(match_id).expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].family, EventFamily::TechDiscovered);

    let stats = ingestor.store().stats().expect("stats");
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.players, 1);
}

#[test]
fn empty_batch_is_fatal() {
    let mut ingestor = ingestor();
    assert!(matches!(
        ingestor.run(&[], false),
        Err(IngestError::NoSources)
    ));
}

#[test]
fn batch_continues_past_bad_archives() {
    let dir = std::env::temp_dir().join(format!("chronicle-batch-test-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");

    let good = dir.join("good.zip");
    fs::write(&good, zip_with_entries(&[("save.xml", TWO_PLAYER_SAVE)])).expect("write good");
    let garbage = dir.join("garbage.zip");
    fs::write(&garbage, b"not a zip").expect("write garbage");
    let missing = dir.join("missing.zip");

    let mut ingestor = ingestor();
    let report = ingestor
        .run(&[good, garbage.clone(), missing.clone()], false)
        .expect("batch should complete");

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 2);
    // No participants registered yet, so the end-of-batch sweep is skipped.
    assert!(report.link.is_none());
    // Every failure is enumerated, never silently dropped.
    let failed: Vec<&str> = report.errors.iter().map(|e| e.source.as_str()).collect();
    assert!(failed.contains(&garbage.display().to_string().as_str()));
    assert!(failed.contains(&missing.display().to_string().as_str()));

    let _ = fs::remove_dir_all(&dir);
}

fn sample_feed() -> TournamentFeed {
    TournamentFeed {
        participants: vec![
            FeedParticipant {
                id: 7,
                display_name: "Ninja".to_string(),
                seed: Some(1),
            },
            FeedParticipant {
                id: 8,
                display_name: "Samurai".to_string(),
                seed: Some(2),
            },
        ],
        matches: vec![FeedMatch {
            id: 100,
            round: 1,
            player1_id: Some(7),
            player2_id: Some(8),
            winner_id: None,
        }],
    }
}

#[test]
fn link_sweep_matches_and_reports_unmatched() {
    let xml = r#"
        <GameRoot Turn="10">
          <Player ID="0" Name="Ninja [OW]"/>
          <Player ID="1" Name="Mystery Guest"/>
        </GameRoot>
    "#;

    let mut ingestor = ingestor();
    ingestor.sync_bracket(&sample_feed()).expect("sync");
    ingestor
        .ingest_archive(archive_from("round1.zip", xml), false)
        .expect("ingest");

    let report = ingestor.link_participants().expect("link");
    assert_eq!(report.considered, 2);
    assert_eq!(report.matched, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.unmatched_detail.len(), 1);
    assert_eq!(report.unmatched_detail[0].names, vec!["Mystery Guest"]);

    let match_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .unwrap()
        .unwrap();
    assert_eq!(
        ingestor.store().participant_of(match_id, 1).expect("query"),
        Some(7)
    );
    assert_eq!(
        ingestor.store().participant_of(match_id, 2).expect("query"),
        None
    );
}

#[test]
fn override_resolves_on_next_sweep() {
    let xml = r#"
        <GameRoot Turn="10">
          <Player ID="0" Name="Mystery Guest"/>
        </GameRoot>
    "#;

    let mut ingestor = ingestor();
    ingestor.sync_bracket(&sample_feed()).expect("sync");
    ingestor
        .ingest_archive(archive_from("round1.zip", xml), false)
        .expect("ingest");

    let first = ingestor.link_participants().expect("first sweep");
    assert_eq!(first.unmatched, 1);

    let match_id = ingestor
        .store()
        .match_id_by_source("round1.zip")
        .unwrap()
        .unwrap();
    ingestor
        .store()
        .add_override(&OverrideRow {
            match_id,
            raw_name: "Mystery Guest".to_string(),
            participant_id: 8,
            reason: "streaming alias confirmed in discord".to_string(),
        })
        .expect("override");

    let second = ingestor.link_participants().expect("second sweep");
    assert_eq!(second.matched, 1);
    assert_eq!(second.unmatched, 0);
    assert_eq!(
        ingestor.store().participant_of(match_id, 1).expect("query"),
        Some(8)
    );
}

#[test]
fn empty_registry_skips_link_sweep() {
    let mut ingestor = ingestor();
    ingestor
        .ingest_archive(archive_from("round1.zip", TWO_PLAYER_SAVE), false)
        .expect("ingest");

    let report = ingestor.link_participants().expect("link");
    assert_eq!(report.considered, 0);
    assert!(report.unmatched_detail.is_empty());
}
