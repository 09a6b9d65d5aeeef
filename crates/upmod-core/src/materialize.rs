//! Incremental module materialization
//!
//! Copies every file entry of a qualifying artifact's archive into the
//! module's directory under the module root. A destination file is only
//! rewritten when it is older than the artifact's packaged file.
//!
//! Materialization is not transactional: a failure part way through an
//! archive leaves the files written so far in place.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::time::SystemTime;

use crate::archive::open_archive;
use crate::manifest::ManifestDescriptor;
use crate::{Error, Result};

/// Materialize helper for upstream modules
pub struct Materializer;

impl Materializer {
    /// Copy a module's archive contents into `module_root`
    ///
    /// Returns the number of files written; files skipped by the freshness
    /// check are not counted.
    pub fn materialize(descriptor: &ManifestDescriptor, module_root: &Utf8Path) -> Result<usize> {
        let artifact = descriptor.artifact();
        let target_dir = descriptor.module_dir(module_root);

        std::fs::create_dir_all(&target_dir).map_err(|e| {
            Error::output_directory(
                format!("{}: {}", target_dir, e),
                "Check permissions on the module directory",
            )
        })?;

        let archive_path = artifact.file.as_deref().ok_or_else(|| {
            Error::archive_open(
                format!("{} has no packaged file", artifact),
                "The dependency graph must point every dependency at its archive",
            )
        })?;

        let artifact_modified = modified_time(archive_path).map_err(|e| {
            Error::archive_open(
                format!("{}: cannot read modification time: {}", archive_path, e),
                "Check that the dependency is still readable",
            )
        })?;

        let mut zip = open_archive(archive_path)?;
        let mut written = 0;

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(|e| {
                Error::archive_open(
                    format!("{}: cannot read entry #{}: {}", archive_path, index, e),
                    "The archive may be corrupted",
                )
            })?;

            if entry.is_dir() {
                continue;
            }

            let Some(relative) = entry
                .enclosed_name()
                .map(|p| p.to_path_buf())
                .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            else {
                tracing::warn!(
                    archive = %archive_path,
                    entry = entry.name(),
                    "Skipping entry with unsafe or non UTF-8 path"
                );
                continue;
            };

            let destination = target_dir.join(&relative);
            if is_fresh(&destination, artifact_modified) {
                tracing::trace!(path = %destination, "Up to date");
                continue;
            }

            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::output_directory(
                        format!("{}: {}", parent, e),
                        "Check permissions on the module directory",
                    )
                })?;
            }

            tracing::debug!(path = %destination, "Copying module file");
            write_entry(&mut entry, &destination).map_err(|e| {
                Error::entry_write(
                    format!("{}: {}", destination, e),
                    "Check free disk space and permissions on the module directory",
                )
            })?;
            written += 1;
        }

        tracing::debug!(
            module = descriptor.name(),
            dir = %target_dir,
            written,
            "Materialized module"
        );

        Ok(written)
    }
}

/// Whether an existing destination is at least as new as the artifact
fn is_fresh(destination: &Utf8Path, artifact_modified: SystemTime) -> bool {
    match modified_time(destination) {
        Ok(modified) => modified >= artifact_modified,
        Err(_) => false,
    }
}

fn modified_time(path: &Utf8Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Stream an entry's decompressed content to a file, replacing it
fn write_entry(entry: &mut impl Read, destination: &Utf8Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(destination)?);
    io::copy(entry, &mut out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{artifact, write_zip};
    use std::time::Duration;
    use tempfile::TempDir;

    fn set_modified(path: &Utf8Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn module(
        dir: &Utf8Path,
        jar_name: &str,
        manifest: &str,
        files: &[(&str, &[u8])],
    ) -> ManifestDescriptor {
        let jar = dir.join(jar_name);
        let mut entries: Vec<(&str, &[u8])> = vec![("package.json", manifest.as_bytes())];
        entries.extend_from_slice(files);
        write_zip(&jar, &entries);
        ManifestDescriptor::from_bytes(artifact(jar_name, jar.as_str()), manifest.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_materialize_plain_module() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "widgets.jar",
            r#"{"name":"widgets"}"#,
            &[
                ("index.js", b"exports.a = 1;".as_slice()),
                ("lib/", b"".as_slice()),
                ("lib/util.js", b"exports.b = 2;".as_slice()),
            ],
        );

        let written = Materializer::materialize(&descriptor, &module_root).unwrap();

        assert_eq!(written, 3);
        let target = module_root.join("widgets");
        assert_eq!(std::fs::read(target.join("index.js")).unwrap(), b"exports.a = 1;");
        assert_eq!(std::fs::read(target.join("lib/util.js")).unwrap(), b"exports.b = 2;");
        assert!(target.join("package.json").is_file());
    }

    #[test]
    fn test_materialize_scoped_module() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "scoped.jar",
            r#"{"name":"@scope/widgets"}"#,
            &[("dist/main.js", b"main".as_slice())],
        );

        Materializer::materialize(&descriptor, &module_root).unwrap();

        assert!(module_root.join("@scope/widgets/dist/main.js").is_file());
        assert!(module_root.join("@scope/widgets/package.json").is_file());
    }

    #[test]
    fn test_second_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "widgets.jar",
            r#"{"name":"widgets"}"#,
            &[("index.js", b"x".as_slice())],
        );

        assert_eq!(Materializer::materialize(&descriptor, &module_root).unwrap(), 2);
        assert_eq!(Materializer::materialize(&descriptor, &module_root).unwrap(), 0);
    }

    #[test]
    fn test_stale_file_is_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "widgets.jar",
            r#"{"name":"widgets"}"#,
            &[("index.js", b"fresh".as_slice())],
        );
        Materializer::materialize(&descriptor, &module_root).unwrap();

        let now = SystemTime::now();
        let index = module_root.join("widgets/index.js");
        std::fs::write(&index, b"stale").unwrap();
        set_modified(&dir.join("widgets.jar"), now);
        set_modified(&index, now - Duration::from_secs(3600));
        set_modified(&module_root.join("widgets/package.json"), now);

        let written = Materializer::materialize(&descriptor, &module_root).unwrap();

        assert_eq!(written, 1);
        assert_eq!(std::fs::read(&index).unwrap(), b"fresh");
    }

    #[test]
    fn test_newer_or_equal_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "widgets.jar",
            r#"{"name":"widgets"}"#,
            &[("index.js", b"from archive".as_slice())],
        );
        Materializer::materialize(&descriptor, &module_root).unwrap();

        let now = SystemTime::now();
        let index = module_root.join("widgets/index.js");
        let manifest = module_root.join("widgets/package.json");
        std::fs::write(&index, b"edited locally").unwrap();
        set_modified(&dir.join("widgets.jar"), now);
        set_modified(&index, now + Duration::from_secs(3600));
        set_modified(&manifest, now);

        let written = Materializer::materialize(&descriptor, &module_root).unwrap();

        assert_eq!(written, 0);
        assert_eq!(std::fs::read(&index).unwrap(), b"edited locally");
    }

    #[test]
    fn test_missing_archive_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let descriptor = module(dir, "gone.jar", r#"{"name":"gone"}"#, &[]);
        std::fs::remove_file(dir.join("gone.jar")).unwrap();

        let result = Materializer::materialize(&descriptor, &dir.join("node_modules"));
        assert!(matches!(result, Err(Error::ArchiveOpen { .. })));
    }

    #[test]
    fn test_uncreatable_target_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let descriptor = module(dir, "widgets.jar", r#"{"name":"widgets"}"#, &[]);

        // A regular file where the module root should be
        let module_root = dir.join("node_modules");
        std::fs::write(&module_root, b"").unwrap();

        let result = Materializer::materialize(&descriptor, &module_root);
        assert!(matches!(result, Err(Error::OutputDirectory { .. })));
    }

    #[test]
    fn test_unsafe_entry_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "evil.jar",
            r#"{"name":"evil"}"#,
            &[("../../escaped.js", b"nope".as_slice())],
        );

        let written = Materializer::materialize(&descriptor, &module_root).unwrap();

        assert_eq!(written, 1);
        assert!(!dir.join("escaped.js").exists());
    }

    #[test]
    fn test_unwritable_entry_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();
        let module_root = dir.join("node_modules");
        let descriptor = module(
            dir,
            "widgets.jar",
            r#"{"name":"widgets"}"#,
            &[("index.js", b"exports.a = 1;".as_slice())],
        );

        // A stale directory occupies the destination of index.js
        std::fs::create_dir_all(module_root.join("widgets/index.js")).unwrap();
        set_modified(
            &dir.join("widgets.jar"),
            SystemTime::now() + Duration::from_secs(3600),
        );

        let result = Materializer::materialize(&descriptor, &module_root);
        assert!(matches!(result, Err(Error::EntryWrite { .. })));
    }
}
