pub mod archive;
pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod save;
pub mod store;

#[cfg(test)]
mod ingest_tests;

// Re-exports for convenience
pub use archive::{SaveArchive, read_archive};
pub use error::{ArchiveError, IngestError, ParseError, StoreError};
pub use identity::{NameIndex, ParticipantMatcher, normalize_name};
pub use ingest::Ingestor;
pub use model::{EventFamily, EventSource, MatchEvent};
pub use normalize::normalize_events;
pub use save::{ParsedSave, parse_save};
pub use store::Store;
