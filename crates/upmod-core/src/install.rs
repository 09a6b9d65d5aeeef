//! Upstream module installation
//!
//! Ties the pieces together: obtain the dependency graph, resolve the
//! qualifying upstream modules, then materialize each of them under the
//! module root.

use camino::{Utf8Path, Utf8PathBuf};
use std::time::{Duration, Instant};

use crate::archive::ArchiveInspector;
use crate::graph::{Coordinate, GraphProvider};
use crate::manifest::ManifestDescriptor;
use crate::materialize::Materializer;
use crate::resolve::resolve_qualifying_artifacts;
use crate::{Error, Result};

/// Options for an installation run
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Directory receiving one subdirectory per module name
    pub module_root: Utf8PathBuf,
    /// Resolve only; do not write anything
    pub dry_run: bool,
}

impl InstallOptions {
    pub fn new(module_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            module_root: module_root.into(),
            dry_run: false,
        }
    }
}

/// A module handled during an installation run
#[derive(Debug, Clone)]
pub struct InstalledModule {
    /// Declared module name
    pub name: String,
    /// Artifact providing the module
    pub artifact: Coordinate,
    /// Directory the module is materialized into
    pub target_dir: Utf8PathBuf,
    /// Files written for this module
    pub files_written: usize,
}

/// Result of an installation run
#[derive(Debug)]
pub struct InstallReport {
    /// The project the graph is rooted at
    pub project: Coordinate,
    /// Modules in discovery order
    pub modules: Vec<InstalledModule>,
    /// Files written across all modules
    pub files_written: usize,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// Installs upstream modules for a project
pub struct Installer<'a> {
    graph: &'a dyn GraphProvider,
    inspector: &'a dyn ArchiveInspector,
}

impl<'a> Installer<'a> {
    /// Create a new installer
    pub fn new(graph: &'a dyn GraphProvider, inspector: &'a dyn ArchiveInspector) -> Self {
        Self { graph, inspector }
    }

    /// Resolve the qualifying upstream modules without writing anything
    pub fn resolve(&self) -> Result<(Coordinate, Vec<ManifestDescriptor>)> {
        let root = self.graph.dependency_graph()?;
        let modules = resolve_qualifying_artifacts(&root, self.inspector);
        Ok((root.coordinate().clone(), modules))
    }

    /// Resolve and materialize every qualifying upstream module
    ///
    /// Any error after resolution aborts the run; modules materialized
    /// before the failure stay on disk.
    pub fn install(&self, options: &InstallOptions) -> Result<InstallReport> {
        let start = Instant::now();
        let (project, descriptors) = self.resolve()?;

        if !options.dry_run {
            ensure_module_root(&options.module_root)?;
        }

        let mut modules = Vec::with_capacity(descriptors.len());
        let mut files_written = 0;

        for descriptor in &descriptors {
            tracing::debug!(
                artifact = %descriptor.artifact(),
                module = descriptor.name(),
                "Using artifact"
            );

            let written = if options.dry_run {
                0
            } else {
                Materializer::materialize(descriptor, &options.module_root)?
            };
            files_written += written;

            modules.push(InstalledModule {
                name: descriptor.name().to_string(),
                artifact: descriptor.artifact().coordinate.clone(),
                target_dir: descriptor.module_dir(&options.module_root),
                files_written: written,
            });
        }

        let elapsed = start.elapsed();
        tracing::info!(
            project = %project,
            modules = modules.len(),
            files_written,
            elapsed_ms = elapsed.as_millis() as u64,
            "Done installing upstream modules"
        );

        Ok(InstallReport {
            project,
            modules,
            files_written,
            elapsed,
        })
    }
}

fn ensure_module_root(module_root: &Utf8Path) -> Result<()> {
    std::fs::create_dir_all(module_root).map_err(|e| {
        Error::output_directory(
            format!("{}: {}", module_root, e),
            "Check that the module directory is writable",
        )
    })
}
