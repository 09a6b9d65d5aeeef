//! Project manifest packaging
//!
//! Copies the project's own `package.json` into the build output directory
//! so it ships inside the project's archive, which is what makes the project
//! an upstream module for its dependents.

use camino::Utf8Path;

use crate::archive::MANIFEST_ENTRY;
use crate::{Error, Result};

/// Copy `<project_dir>/package.json` into `output_dir` when it is newer
///
/// Returns true when the file was copied. A project without a readable
/// manifest is left alone.
pub fn copy_project_manifest(project_dir: &Utf8Path, output_dir: &Utf8Path) -> Result<bool> {
    let source = project_dir.join(MANIFEST_ENTRY);
    if !source.is_file() || std::fs::File::open(&source).is_err() {
        tracing::debug!(path = %source, "No readable project manifest");
        return Ok(false);
    }

    let destination = output_dir.join(MANIFEST_ENTRY);
    let source_modified = std::fs::metadata(&source)?.modified()?;
    let up_to_date = match std::fs::metadata(&destination).and_then(|m| m.modified()) {
        Ok(modified) => source_modified <= modified,
        Err(_) => false,
    };

    if up_to_date {
        tracing::debug!(path = %destination, "Project manifest up to date");
        return Ok(false);
    }

    std::fs::create_dir_all(output_dir).map_err(|e| {
        Error::output_directory(
            format!("{}: {}", output_dir, e),
            "Check that the build output directory is writable",
        )
    })?;

    tracing::info!("Adding {} to {}", MANIFEST_ENTRY, destination);
    std::fs::copy(&source, &destination).map_err(|e| {
        Error::entry_write(
            format!("{}: {}", destination, e),
            "Check free disk space and permissions on the build output directory",
        )
    })?;
    Ok(true)
}
