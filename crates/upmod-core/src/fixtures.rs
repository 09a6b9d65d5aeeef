//! Shared helpers for unit tests

use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::archive::ArchiveInspector;
use crate::graph::{Artifact, Coordinate, DependencyNode};
use crate::{Error, Result};

/// Write a zip archive; names ending in `/` become directory entries
pub(crate) fn write_zip(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.trim_end_matches('/'), options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }

    zip.finish().unwrap();
}

/// Artifact with a packaged file
pub(crate) fn artifact(name: &str, file: &str) -> Artifact {
    Artifact::new(
        Coordinate::new("io.example", name, "1.0.0"),
        Some(Utf8PathBuf::from(file)),
    )
}

/// Build a node from an artifact and its children
pub(crate) fn node(artifact: Artifact, children: Vec<Arc<DependencyNode>>) -> Arc<DependencyNode> {
    Arc::new(DependencyNode::with_children(artifact, children))
}

/// In-memory archives that record every open
#[derive(Debug, Default)]
pub(crate) struct MemoryInspector {
    archives: HashMap<Utf8PathBuf, HashMap<String, Vec<u8>>>,
    opens: RefCell<Vec<Utf8PathBuf>>,
}

impl MemoryInspector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an archive holding the given entries
    pub(crate) fn with_archive(mut self, path: &str, entries: &[(&str, &str)]) -> Self {
        let contents = entries
            .iter()
            .map(|(name, data)| (name.to_string(), data.as_bytes().to_vec()))
            .collect();
        self.archives.insert(Utf8PathBuf::from(path), contents);
        self
    }

    /// Register an archive whose manifest declares `name`
    pub(crate) fn with_module(self, path: &str, name: &str) -> Self {
        let manifest = format!(r#"{{"name":"{}","version":"1.0.0"}}"#, name);
        self.with_archive(path, &[("package.json", manifest.as_str())])
    }

    /// Number of times an archive was opened
    pub(crate) fn open_count(&self, path: &str) -> usize {
        self.opens
            .borrow()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    /// Every opened archive, in order
    pub(crate) fn opened(&self) -> Vec<Utf8PathBuf> {
        self.opens.borrow().clone()
    }
}

impl ArchiveInspector for MemoryInspector {
    fn find_entry(&self, archive: &Utf8Path, entry_name: &str) -> Result<Option<Vec<u8>>> {
        self.opens.borrow_mut().push(archive.to_path_buf());
        let entries = self.archives.get(archive).ok_or_else(|| {
            Error::archive_open(format!("{}: not found", archive), "test archive missing")
        })?;
        Ok(entries.get(entry_name).cloned())
    }
}
