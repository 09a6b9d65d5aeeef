//! Dependency graph model and graph providers
//!
//! This module handles:
//! - Artifact identity (group, name, version) and packaged file location
//! - The dependency tree handed to the resolver
//! - Loading that tree from a graph file exported by the build tool

use camino::{Utf8Path, Utf8PathBuf};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{Error, Result};

/// Artifact identity: `group:name:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Coordinate::new(*group, *name, *version))
            }
            _ => Err(Error::graph_access(
                format!("Malformed artifact coordinate '{}'", s),
                "Coordinates are written as group:name:version",
            )),
        }
    }
}

/// A resolved dependency and the packaged file backing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact identity
    pub coordinate: Coordinate,

    /// Packaged file on disk (the project itself may have none)
    pub file: Option<Utf8PathBuf>,
}

impl Artifact {
    pub fn new(coordinate: Coordinate, file: Option<Utf8PathBuf>) -> Self {
        Self { coordinate, file }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.coordinate.fmt(f)
    }
}

/// A node of the project's dependency tree
///
/// Children are shared, so an artifact reachable through several paths is a
/// single node in memory.
#[derive(Debug)]
pub struct DependencyNode {
    pub artifact: Artifact,
    pub children: Vec<Arc<DependencyNode>>,
}

impl DependencyNode {
    /// Create a leaf node
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            children: Vec::new(),
        }
    }

    /// Create a node with the given children, in order
    pub fn with_children(artifact: Artifact, children: Vec<Arc<DependencyNode>>) -> Self {
        Self { artifact, children }
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.artifact.coordinate
    }
}

/// Source of the dependency graph rooted at the current project
///
/// Any failure here is fatal for the whole run.
pub trait GraphProvider {
    fn dependency_graph(&self) -> Result<Arc<DependencyNode>>;
}

impl<F> GraphProvider for F
where
    F: Fn() -> Result<Arc<DependencyNode>>,
{
    fn dependency_graph(&self) -> Result<Arc<DependencyNode>> {
        self()
    }
}

/// Graph provider reading a JSON graph file exported by the build tool
///
/// ```json
/// {
///   "root": "io.example:app:1.0.0",
///   "artifacts": [
///     { "coordinate": "io.example:app:1.0.0", "dependencies": ["io.example:ui:2.0"] },
///     { "coordinate": "io.example:ui:2.0", "file": "repo/ui-2.0.jar" }
///   ]
/// }
/// ```
///
/// Relative `file` paths are resolved against the directory of the graph file.
#[derive(Debug, Clone)]
pub struct GraphFile {
    path: Utf8PathBuf,
}

impl GraphFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Build the dependency tree from graph file content
    pub fn parse(content: &str, base_dir: &Utf8Path) -> Result<Arc<DependencyNode>> {
        let raw: RawGraph = serde_json::from_str(content).map_err(|e| {
            Error::graph_access(
                format!("Failed to parse dependency graph: {}", e),
                "The graph file must be a JSON object with 'root' and 'artifacts'",
            )
        })?;

        build_tree(raw, base_dir)
    }
}

impl GraphProvider for GraphFile {
    fn dependency_graph(&self) -> Result<Arc<DependencyNode>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::graph_access(
                format!("Failed to read dependency graph {}: {}", self.path, e),
                "Export the dependency graph from the build tool first",
            )
        })?;

        let base_dir = self.path.parent().unwrap_or_else(|| Utf8Path::new("."));
        let root = Self::parse(&content, base_dir)?;
        tracing::debug!(path = %self.path, root = %root.coordinate(), "Loaded dependency graph");
        Ok(root)
    }
}

/// Raw graph file structure for deserialization
#[derive(Debug, Deserialize)]
struct RawGraph {
    root: String,
    artifacts: Vec<RawArtifact>,
}

/// Artifact entry in the graph file
#[derive(Debug, Deserialize)]
struct RawArtifact {
    coordinate: String,
    #[serde(default)]
    file: Option<Utf8PathBuf>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Parsed artifact entry, before node construction
struct Entry {
    artifact: Artifact,
    dependencies: Vec<Coordinate>,
}

/// Build shared dependency nodes from the raw graph
///
/// Nodes are built in reverse topological order so that every child exists
/// before its parents.
fn build_tree(raw: RawGraph, base_dir: &Utf8Path) -> Result<Arc<DependencyNode>> {
    let root_coordinate: Coordinate = raw.root.parse()?;

    let mut entries = Vec::with_capacity(raw.artifacts.len());
    for raw_artifact in raw.artifacts {
        let coordinate: Coordinate = raw_artifact.coordinate.parse()?;
        let file = raw_artifact.file.map(|f| {
            if f.is_absolute() {
                f
            } else {
                base_dir.join(f)
            }
        });
        let dependencies = raw_artifact
            .dependencies
            .iter()
            .map(|d| d.parse())
            .collect::<Result<Vec<Coordinate>>>()?;

        entries.push(Entry {
            artifact: Artifact::new(coordinate, file),
            dependencies,
        });
    }

    // Edge from A to B means "A depends on B"
    let mut graph = DiGraph::<usize, ()>::new();
    let mut node_indices: HashMap<&Coordinate, NodeIndex> = HashMap::new();

    for (i, entry) in entries.iter().enumerate() {
        let idx = graph.add_node(i);
        if node_indices.insert(&entry.artifact.coordinate, idx).is_some() {
            return Err(Error::graph_access(
                format!("Duplicate artifact: {}", entry.artifact.coordinate),
                "Each artifact must be listed once in the graph file",
            ));
        }
    }

    for entry in &entries {
        let dependent_idx = node_indices[&entry.artifact.coordinate];
        for dep in &entry.dependencies {
            let dependency_idx = node_indices.get(dep).ok_or_else(|| {
                Error::graph_access(
                    format!(
                        "{} depends on {}, which is not listed in the graph",
                        entry.artifact.coordinate, dep
                    ),
                    "List every dependency under 'artifacts'",
                )
            })?;
            graph.add_edge(dependent_idx, *dependency_idx, ());
        }
    }

    let root_idx = *node_indices.get(&root_coordinate).ok_or_else(|| {
        Error::graph_access(
            format!("Root artifact {} is not listed in the graph", root_coordinate),
            "The 'root' coordinate must match one of the 'artifacts'",
        )
    })?;

    let sorted = toposort(&graph, None).map_err(|cycle| {
        let entry = &entries[graph[cycle.node_id()]];
        Error::graph_access(
            format!(
                "Circular dependency detected at {}",
                entry.artifact.coordinate
            ),
            "The dependency graph must be acyclic",
        )
    })?;

    let mut built: HashMap<NodeIndex, Arc<DependencyNode>> = HashMap::new();
    for idx in sorted.into_iter().rev() {
        let entry = &entries[graph[idx]];
        let children = entry
            .dependencies
            .iter()
            .map(|dep| {
                built.get(&node_indices[dep]).cloned().ok_or_else(|| {
                    Error::graph_access(
                        format!("Dependency {} was not resolved before its dependents", dep),
                        "This is likely a bug in upmod",
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let node = DependencyNode::with_children(entry.artifact.clone(), children);
        built.insert(idx, Arc::new(node));
    }

    built.remove(&root_idx).ok_or_else(|| {
        Error::graph_access(
            format!("Root artifact {} was not built", root_coordinate),
            "This is likely a bug in upmod",
        )
    })
}
