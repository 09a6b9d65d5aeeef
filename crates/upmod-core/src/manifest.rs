//! Module manifest decoding and qualification
//!
//! A dependency qualifies as an upstream module when its packaged archive
//! carries a `package.json` at the root. The manifest's `name` decides where
//! the module is placed under the module root.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};

use crate::archive::{ArchiveInspector, MANIFEST_ENTRY};
use crate::graph::Artifact;
use crate::{Error, Result};

/// Manifest found in a qualifying artifact
#[derive(Debug, Clone)]
pub struct ManifestDescriptor {
    artifact: Artifact,
    name: String,
    manifest: Map<String, Value>,
}

impl ManifestDescriptor {
    /// Decode a manifest read from an artifact's archive
    pub fn from_bytes(artifact: Artifact, data: &[u8]) -> Result<Self> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

        let value: Value = serde_json::from_slice(data).map_err(|e| {
            Error::manifest_decode(
                format!("{}: {} is not valid UTF-8 JSON: {}", artifact, MANIFEST_ENTRY, e),
                "Fix the package.json bundled in this artifact",
            )
        })?;

        let Value::Object(manifest) = value else {
            return Err(Error::manifest_decode(
                format!("{}: {} is not a JSON object", artifact, MANIFEST_ENTRY),
                "Fix the package.json bundled in this artifact",
            ));
        };

        let name = match manifest.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(Error::manifest_decode(
                    format!("{}: 'name' in {} is not a string", artifact, MANIFEST_ENTRY),
                    "The module name must be a string such as \"widgets\" or \"@scope/widgets\"",
                ));
            }
            None => {
                return Err(Error::manifest_decode(
                    format!("{}: {} has no 'name' field", artifact, MANIFEST_ENTRY),
                    "Add a 'name' field to the package.json bundled in this artifact",
                ));
            }
        };

        validate_module_name(&name).map_err(|reason| {
            Error::manifest_decode(
                format!("{}: module name '{}' {}", artifact, name, reason),
                "The module name must be a plain or scoped name such as \"@scope/widgets\"",
            )
        })?;

        Ok(Self {
            artifact,
            name,
            manifest,
        })
    }

    /// Artifact the manifest came from
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Declared module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed manifest content
    pub fn manifest(&self) -> &Map<String, Value> {
        &self.manifest
    }

    /// Directory the module is materialized into: one level per name segment
    pub fn module_dir(&self, module_root: &Utf8Path) -> Utf8PathBuf {
        self.name
            .split('/')
            .fold(module_root.to_path_buf(), |dir, segment| dir.join(segment))
    }
}

/// Reject module names that cannot be placed under the module root
///
/// A name is either a single segment (`widgets`) or a scope plus a segment
/// (`@scope/widgets`), so two different names never nest inside each other.
fn validate_module_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("is empty");
    }
    if name.contains('\\') {
        return Err("contains a backslash");
    }

    let segments: Vec<&str> = name.split('/').collect();
    for segment in &segments {
        match *segment {
            "" => return Err("has an empty path segment"),
            "." | ".." => return Err("contains a relative path segment"),
            _ => {}
        }
    }

    match segments.as_slice() {
        [single] if single.starts_with('@') => Err("is a scope without a module name"),
        [_] => Ok(()),
        [scope, _] if scope.starts_with('@') => Ok(()),
        [_, _] => Err("has a '/' but no '@' scope"),
        _ => Err("has more than one '/'"),
    }
}

/// Outcome of inspecting a single dependency
#[derive(Debug)]
pub enum Qualification {
    /// The artifact carries a manifest
    Qualifies(ManifestDescriptor),
    /// The artifact opened fine but carries no manifest
    DoesNotQualify,
}

/// Check whether an artifact is an upstream module
///
/// Errors are archive or manifest problems for this artifact only; see
/// [`Error::is_node_local`].
pub fn inspect(artifact: &Artifact, inspector: &dyn ArchiveInspector) -> Result<Qualification> {
    let file = artifact.file.as_deref().ok_or_else(|| {
        Error::archive_open(
            format!("{} has no packaged file", artifact),
            "The dependency graph must point every dependency at its archive",
        )
    })?;

    match inspector.find_entry(file, MANIFEST_ENTRY)? {
        Some(data) => Ok(Qualification::Qualifies(ManifestDescriptor::from_bytes(
            artifact.clone(),
            &data,
        )?)),
        None => Ok(Qualification::DoesNotQualify),
    }
}
