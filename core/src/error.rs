//! Error taxonomy for the ingestion pipeline.
//!
//! Failures are scoped: a bad record is skipped and counted, a bad
//! archive fails that archive only, and the batch keeps going. The sole
//! fatal condition is having nothing to ingest at all.

use std::path::PathBuf;

use thiserror::Error;

/// A source archive could not be opened or does not contain exactly one
/// save document. Always localized to that archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to read archive {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not a valid save archive: {0}")]
    Malformed(#[from] zip::result::ZipError),

    #[error("archive contains no save document")]
    NoDocument,

    #[error("archive contains {0} save documents, expected exactly one")]
    MultipleDocuments(usize),

    #[error("failed to read save document from archive: {0}")]
    Entry(#[from] std::io::Error),
}

/// The save document inside an archive could not be deserialized.
/// Individual records with missing fields are not errors; they are
/// skipped and counted by the parser.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed save document: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// Persistence failures from the embedded store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to serialize event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("stored row references unknown event family {0:?}")]
    UnknownFamily(String),
}

/// Top-level pipeline error. Per-archive variants are caught by the
/// orchestrator and reported; only `NoSources` aborts a run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no source archives to ingest")]
    NoSources,

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
