//! Per-match archive reading.
//!
//! One compressed container holds exactly one save document. The
//! archive's identity is the SHA-256 of its raw bytes; unchanged bytes
//! mean an unchanged match, which is what makes re-imports idempotent.

use std::fmt::Write as _;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use zip::ZipArchive;

use crate::error::ArchiveError;

/// The single save document recovered from one archive.
#[derive(Debug, Clone)]
pub struct SaveArchive {
    /// File name of the source archive (not the inner document).
    pub name: String,
    /// Hex SHA-256 of the raw archive bytes.
    pub content_hash: String,
    /// The save document as text.
    pub xml: String,
}

/// Open the archive at `path` and extract its save document.
pub fn read_archive(path: &Path) -> Result<SaveArchive, ArchiveError> {
    let bytes = fs::read(path).map_err(|source| ArchiveError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_archive_bytes(&name, &bytes)
}

/// Extract the save document from raw archive bytes.
///
/// Split out from [`read_archive`] so tests can feed in-memory archives
/// without touching disk.
pub fn read_archive_bytes(name: &str, bytes: &[u8]) -> Result<SaveArchive, ArchiveError> {
    let content_hash = hex_sha256(bytes);

    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let documents: Vec<usize> = (0..zip.len())
        .filter(|&i| {
            zip.by_index(i)
                .map(|f| f.is_file() && f.name().to_ascii_lowercase().ends_with(".xml"))
                .unwrap_or(false)
        })
        .collect();

    let index = match documents.as_slice() {
        [] => return Err(ArchiveError::NoDocument),
        [one] => *one,
        many => return Err(ArchiveError::MultipleDocuments(many.len())),
    };

    let mut xml = String::new();
    zip.by_index(index)?.read_to_string(&mut xml)?;

    Ok(SaveArchive {
        name: name.to_string(),
        content_hash,
        xml,
    })
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Build an in-memory archive for tests.
#[cfg(test)]
pub(crate) fn zip_with_entries(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
