//! Upstream module resolution
//!
//! Walks the dependency tree depth-first, pre-order, and collects every
//! dependency that qualifies as an upstream module. The walk only descends
//! through the project itself and through qualifying modules: the
//! dependencies of a plain library are never inspected.

use camino::Utf8PathBuf;
use std::collections::HashSet;

use crate::archive::ArchiveInspector;
use crate::graph::{Artifact, Coordinate, DependencyNode};
use crate::manifest::{inspect, ManifestDescriptor, Qualification};

/// Identity used to avoid inspecting an artifact twice
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ArtifactIdentity {
    /// Canonical path of the packaged file
    File(Utf8PathBuf),
    /// Artifact without a packaged file
    Coordinate(Coordinate),
}

impl ArtifactIdentity {
    fn of(artifact: &Artifact) -> Self {
        match &artifact.file {
            Some(file) => Self::File(file.canonicalize_utf8().unwrap_or_else(|_| file.clone())),
            None => Self::Coordinate(artifact.coordinate.clone()),
        }
    }
}

/// Artifacts already examined in the current resolution run
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<ArtifactIdentity>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact; returns false if it was already visited
    pub fn insert(&mut self, artifact: &Artifact) -> bool {
        self.seen.insert(ArtifactIdentity::of(artifact))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Collect the upstream modules reachable from the project node
///
/// Results are in discovery order: parents before children, siblings in
/// graph order. Archive and manifest problems prune the affected node and are
/// logged; they never abort the walk.
pub fn resolve_qualifying_artifacts(
    root: &DependencyNode,
    inspector: &dyn ArchiveInspector,
) -> Vec<ManifestDescriptor> {
    let project = root.coordinate();
    let mut visited = VisitedSet::new();
    let mut results = Vec::new();

    collect(root, project, inspector, &mut visited, &mut results);

    tracing::debug!(
        project = %project,
        inspected = visited.len(),
        qualifying = results.len(),
        "Resolved upstream modules"
    );

    results
}

fn collect(
    node: &DependencyNode,
    project: &Coordinate,
    inspector: &dyn ArchiveInspector,
    visited: &mut VisitedSet,
    results: &mut Vec<ManifestDescriptor>,
) {
    let artifact = &node.artifact;

    // The project is never its own upstream module, but its dependencies are
    let descend = if artifact.coordinate == *project {
        true
    } else {
        if !visited.insert(artifact) {
            tracing::trace!(artifact = %artifact, "Already inspected");
            return;
        }

        tracing::debug!(artifact = %artifact, "Testing artifact for upstream module");
        match inspect(artifact, inspector) {
            Ok(Qualification::Qualifies(descriptor)) => {
                tracing::info!(
                    artifact = %artifact,
                    module = descriptor.name(),
                    "Adding upstream module"
                );
                results.push(descriptor);
                true
            }
            Ok(Qualification::DoesNotQualify) => {
                tracing::debug!(artifact = %artifact, "Not an upstream module, pruning");
                false
            }
            Err(e) => {
                tracing::warn!(artifact = %artifact, error = %e, "Unable to inspect artifact, pruning");
                false
            }
        }
    };

    if descend {
        for child in &node.children {
            collect(child, project, inspector, visited, results);
        }
    }
}
