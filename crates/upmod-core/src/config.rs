//! Configuration file parsing and merging
//!
//! This module handles parsing of `upmod.toml` and `upmod.local.toml` files.
//! The local file is overlaid on the base file: tables are merged
//! recursively, arrays and scalars are replaced.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::Result;

/// Base configuration file name
pub const CONFIG_FILE: &str = "upmod.toml";

/// Local override file name (not meant to be committed)
pub const LOCAL_CONFIG_FILE: &str = "upmod.local.toml";

/// Main configuration structure for upmod
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Module output settings
    pub modules: ModulesConfig,

    /// Dependency graph source settings
    pub graph: GraphConfig,

    /// Project manifest copy settings
    pub resources: ResourcesConfig,
}

/// Module output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Module root directory, relative to the project (default: "node_modules")
    pub dir: Utf8PathBuf,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            dir: Utf8PathBuf::from("node_modules"),
        }
    }
}

/// Dependency graph configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph file exported by the build tool (default: "dependency-graph.json")
    pub file: Utf8PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            file: Utf8PathBuf::from("dependency-graph.json"),
        }
    }
}

/// Project manifest copy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Build output directory receiving `package.json` (default: "target/classes")
    pub output_dir: Utf8PathBuf,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("target/classes"),
        }
    }
}

impl Config {
    /// Load configuration from a project directory.
    ///
    /// This loads `upmod.toml` and optionally merges `upmod.local.toml` if it exists.
    pub fn load(project_dir: &Utf8Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let local_config_path = project_dir.join(LOCAL_CONFIG_FILE);

        let base_config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<toml::Value>(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let local_config = if local_config_path.exists() {
            let content = std::fs::read_to_string(&local_config_path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        } else {
            None
        };

        let merged = match local_config {
            Some(local) => merge_toml_values(base_config, local),
            None => base_config,
        };

        let config: Config = merged.try_into()?;
        tracing::debug!(
            modules_dir = %config.modules.dir,
            graph_file = %config.graph.file,
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Load configuration from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Absolute module root for a project directory
    pub fn module_root(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.modules.dir)
    }

    /// Absolute graph file path for a project directory
    pub fn graph_file(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.graph.file)
    }

    /// Absolute resources output directory for a project directory
    pub fn resources_output_dir(&self, project_dir: &Utf8Path) -> Utf8PathBuf {
        project_dir.join(&self.resources.output_dir)
    }
}

/// Merge two TOML values:
/// - Tables: recursively merged
/// - Arrays: local replaces base (not merged)
/// - Primitives: local overrides base
fn merge_toml_values(base: toml::Value, local: toml::Value) -> toml::Value {
    match (base, local) {
        (toml::Value::Table(mut base_table), toml::Value::Table(local_table)) => {
            for (key, local_value) in local_table {
                if let Some(base_value) = base_table.remove(&key) {
                    base_table.insert(key, merge_toml_values(base_value, local_value));
                } else {
                    base_table.insert(key, local_value);
                }
            }
            toml::Value::Table(base_table)
        }
        (_, local) => local,
    }
}
