//! chronicle - tournament save-file ingestion CLI.
//!
//! Thin front end over the core pipeline: ingest archives, sync the
//! bracket feed, run the participant link sweep, manage overrides.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

use chronicle_core::config::{AppConfig, load_config};
use chronicle_core::model::OverrideRow;
use chronicle_core::{Ingestor, Store};
use chronicle_types::TournamentFeed;

#[derive(Parser)]
#[command(version, about = "Tournament save-file ingestion")]
struct Cli {
    /// Override the configured database path.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest save archives (defaults to the configured saves directory).
    Ingest {
        /// Re-import even when the archive hash is unchanged.
        #[arg(short, long)]
        force: bool,

        /// Explicit archive paths; when omitted, `saves_directory` is scanned.
        paths: Vec<PathBuf>,
    },

    /// Persist a bracket feed snapshot from a JSON export.
    SyncBracket {
        #[arg(short, long)]
        feed: PathBuf,
    },

    /// Run the participant link sweep over all committed match players.
    Link,

    /// Add a manual (match, raw name) -> participant override.
    AddOverride {
        #[arg(long)]
        match_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        participant: i64,
        #[arg(long)]
        reason: String,
    },

    /// Show stored row counts.
    Status,
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config();

    let db_path = cli.database.unwrap_or_else(|| config.database_path.clone());
    let store = Store::open(&db_path).map_err(|e| e.to_string())?;
    let mut ingestor = Ingestor::new(store);

    match cli.command {
        Commands::Ingest { force, paths } => {
            let sources = if paths.is_empty() {
                scan_saves_directory(&config)?
            } else {
                paths
            };
            let report = ingestor.run(&sources, force).map_err(|e| e.to_string())?;
            println!(
                "processed {}, skipped {}, failed {}",
                report.processed, report.skipped, report.failed
            );
            for error in &report.errors {
                println!("  FAILED {}: {}", error.source, error.message);
            }
            if let Some(link) = &report.link {
                println!(
                    "link sweep: considered {}, matched {}, unmatched {}",
                    link.considered, link.matched, link.unmatched
                );
            }
            if !report.is_clean() {
                return Err(format!("{} archive(s) failed", report.failed));
            }
        }
        Commands::SyncBracket { feed } => {
            let raw = fs::read_to_string(&feed)
                .map_err(|e| format!("cannot read feed {}: {e}", feed.display()))?;
            let feed: TournamentFeed = serde_json::from_str(&raw)
                .map_err(|e| format!("invalid feed export: {e}"))?;
            let report = ingestor.sync_bracket(&feed).map_err(|e| e.to_string())?;
            println!(
                "synced {} participants, {} bracket matches",
                report.participants, report.matches
            );
        }
        Commands::Link => {
            let report = ingestor.link_participants().map_err(|e| e.to_string())?;
            println!(
                "considered {}, matched {}, unmatched {}",
                report.considered, report.matched, report.unmatched
            );
            for detail in &report.unmatched_detail {
                println!("  match {}: {}", detail.match_id, detail.names.join(", "));
            }
        }
        Commands::AddOverride {
            match_id,
            name,
            participant,
            reason,
        } => {
            ingestor
                .store()
                .add_override(&OverrideRow {
                    match_id,
                    raw_name: name.clone(),
                    participant_id: participant,
                    reason,
                })
                .map_err(|e| e.to_string())?;
            println!("override stored for {name:?} in match {match_id}");
        }
        Commands::Status => {
            let stats = ingestor.store().stats().map_err(|e| e.to_string())?;
            println!("matches:      {}", stats.matches);
            println!("players:      {}", stats.players);
            println!("events:       {}", stats.events);
            println!("participants: {}", stats.participants);
        }
    }

    Ok(())
}

/// Collect *.zip archives from the configured saves directory, sorted
/// by name so batch order is stable.
fn scan_saves_directory(config: &AppConfig) -> Result<Vec<PathBuf>, String> {
    let dir = &config.saves_directory;
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("cannot read saves directory {}: {e}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
