//! Error types for upmod

// This warning is a false positive from thiserror macro expansion
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for upmod operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for upmod
///
/// Errors raised while a node is being qualified (`ArchiveOpen`,
/// `ManifestDecode`) only prune that branch of the dependency walk. Every
/// other variant aborts the run.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[help]
        help: String,
    },

    /// The dependency graph could not be obtained
    #[error("Dependency graph error: {message}")]
    GraphAccess {
        message: String,
        #[help]
        help: String,
    },

    /// A packaged artifact could not be opened or read as an archive
    #[error("Cannot open archive: {message}")]
    ArchiveOpen {
        message: String,
        #[help]
        help: String,
    },

    /// A manifest exists but has no usable module name
    #[error("Invalid manifest: {message}")]
    ManifestDecode {
        message: String,
        #[help]
        help: String,
    },

    /// A destination directory could not be created
    #[error("Cannot create output directory: {message}")]
    OutputDirectory {
        message: String,
        #[help]
        help: String,
    },

    /// A destination file could not be written
    #[error("Cannot write module file: {message}")]
    EntryWrite {
        message: String,
        #[help]
        help: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a dependency graph error
    pub fn graph_access(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::GraphAccess {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create an archive open error
    pub fn archive_open(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::ArchiveOpen {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a manifest decode error
    pub fn manifest_decode(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::ManifestDecode {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create an output directory error
    pub fn output_directory(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::OutputDirectory {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create an entry write error
    pub fn entry_write(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::EntryWrite {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Whether this error only disqualifies a single dependency node.
    ///
    /// Returns true for archive and manifest problems, which the graph walk
    /// absorbs by pruning the node.
    pub fn is_node_local(&self) -> bool {
        matches!(self, Self::ArchiveOpen { .. } | Self::ManifestDecode { .. })
    }
}
