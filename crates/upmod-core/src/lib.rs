//! upmod-core - Core library for upmod
//!
//! This crate materializes upstream JavaScript modules shipped inside a
//! project's packaged dependencies, including:
//! - Dependency graph model and graph file loading
//! - Archive introspection for `package.json` manifests
//! - Resolution of the qualifying upstream modules
//! - Incremental extraction into a local module directory
//! - Configuration file parsing and merging

pub mod archive;
pub mod config;
pub mod error;
pub mod graph;
pub mod install;
pub mod manifest;
pub mod materialize;
pub mod resolve;
pub mod resources;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
