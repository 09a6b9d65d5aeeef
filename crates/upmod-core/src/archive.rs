//! Archive introspection
//!
//! Answers "does this packaged artifact contain the named entry?" without
//! extracting anything else. Packaged artifacts are zip-structured archives
//! (jar, hpi, zip).

use camino::Utf8Path;
use std::fs::File;
use std::io::Read;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::{Error, Result};

/// Manifest entry looked up at the archive root
pub const MANIFEST_ENTRY: &str = "package.json";

/// Upper bound on the buffer reserved up front for an entry
const MAX_SIZE_HINT: u64 = 1 << 20;

/// Read access to single entries of packaged artifacts
pub trait ArchiveInspector {
    /// Look up an entry by exact name.
    ///
    /// Returns `Ok(None)` when the archive opens but has no such file entry.
    /// Fails with [`Error::ArchiveOpen`] when the archive itself cannot be
    /// opened or read.
    fn find_entry(&self, archive: &Utf8Path, entry_name: &str) -> Result<Option<Vec<u8>>>;
}

/// Inspector backed by zip archives on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipInspector;

impl ArchiveInspector for ZipInspector {
    fn find_entry(&self, archive: &Utf8Path, entry_name: &str) -> Result<Option<Vec<u8>>> {
        tracing::trace!(archive = %archive, entry = entry_name, "Looking up archive entry");

        let mut zip = open_archive(archive)?;
        let mut entry = match zip.by_name(entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::archive_open(
                    format!("{}: cannot read entry '{}': {}", archive, entry_name, e),
                    "The archive may be corrupted",
                ));
            }
        };

        if entry.is_dir() {
            return Ok(None);
        }

        let mut data = Vec::with_capacity(size_hint(entry.size()));
        entry.read_to_end(&mut data).map_err(|e| {
            Error::archive_open(
                format!("{}: cannot decompress entry '{}': {}", archive, entry_name, e),
                "The archive may be corrupted",
            )
        })?;

        Ok(Some(data))
    }
}

/// Open a zip archive for reading
pub(crate) fn open_archive(path: &Utf8Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| {
        Error::archive_open(
            format!("{}: {}", path, e),
            "Check that the dependency has been downloaded and is readable",
        )
    })?;

    ZipArchive::new(file).map_err(|e| {
        Error::archive_open(
            format!("{}: not a readable zip archive: {}", path, e),
            "The packaged artifact may be corrupted",
        )
    })
}

/// Buffer capacity for an entry whose header declares `declared` bytes
///
/// The header is untrusted, so the reservation is capped.
fn size_hint(declared: u64) -> usize {
    declared.min(MAX_SIZE_HINT) as usize
}
