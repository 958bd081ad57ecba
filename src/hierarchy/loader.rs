// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Hierarchy document loading and `$ref` resolution.
//!
//! Documents are JSON (`.json`) or YAML (`.yml`, `.yaml`); the extension
//! selects the parser. A node may point at another document through `$ref`.
//! Relative reference paths are anchored to the directory of the root
//! document, never to the current working directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{HierarchyError, Result};

use super::spec::{HierarchyNode, HierarchySpec};

/// Serialization format of a hierarchy or reference document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON document.
    Json,

    /// YAML document.
    Yaml,
}

impl DocumentFormat {
    /// Select the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yml") | Some("yaml") => Ok(Self::Yaml),
            _ => Err(HierarchyError::unsupported_format(format!(
                "{} (expected .json, .yml or .yaml)",
                path.display()
            ))),
        }
    }

    /// Deserialize a document body.
    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        match self {
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }
}

/// Load the top-level hierarchy document.
///
/// # Errors
///
/// Returns an error if the file is missing, is a directory, has an
/// unsupported extension, or cannot be parsed.
pub fn load_hierarchy(path: impl AsRef<Path>) -> Result<HierarchySpec> {
    let path = path.as_ref();
    check_regular_file(path).map_err(HierarchyError::config)?;
    let format = DocumentFormat::from_path(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| {
        HierarchyError::config(format!("Failed to read {}: {e}", path.display()))
    })?;

    let spec: HierarchySpec = format.parse(&content).map_err(|e| {
        HierarchyError::config(format!("Failed to parse {}: {e}", path.display()))
    })?;

    debug!(
        "Loaded {} with {} root, {} intermediate and {} leaf entries",
        path.display(),
        spec.root_authorities.len(),
        spec.intermediate_authorities.len(),
        spec.leaf_certificates.len()
    );

    Ok(spec)
}

/// Resolve a `$ref` path against the root configuration file.
///
/// Absolute references are returned unchanged. Relative references have a
/// leading `./` stripped and are joined onto the directory that contains
/// `config_path`.
pub fn resolve_reference_path(config_path: &Path, reference: &str) -> PathBuf {
    let reference_path = Path::new(reference);
    if reference_path.is_absolute() {
        return reference_path.to_path_buf();
    }

    let relative = reference.strip_prefix("./").unwrap_or(reference);
    match config_path.parent() {
        Some(dir) => dir.join(relative),
        None => PathBuf::from(relative),
    }
}

/// Merge the referenced document into a node declared by reference.
///
/// Nodes without a `$ref` are left untouched. Fields present in the
/// referenced document overwrite the node's fields; fields it omits keep
/// their inline values. A `$ref` inside the referenced document is not
/// followed.
pub fn resolve_reference<T>(node: &mut T, config_path: &Path) -> Result<()>
where
    T: HierarchyNode + Serialize + DeserializeOwned,
{
    let Some(reference) = node.reference() else {
        return Ok(());
    };

    let path = resolve_reference_path(config_path, reference);
    debug!("Loading {} from {}", T::KIND.description(), path.display());

    check_regular_file(&path).map_err(HierarchyError::reference)?;
    let format = DocumentFormat::from_path(&path)
        .map_err(|e| HierarchyError::reference(e.to_string()))?;

    let content = std::fs::read_to_string(&path).map_err(|e| {
        HierarchyError::reference(format!("Failed to read {}: {e}", path.display()))
    })?;

    let mut fragment: Value = format.parse(&content).map_err(|e| {
        HierarchyError::reference(format!("Failed to parse {}: {e}", path.display()))
    })?;

    let Some(fields) = fragment.as_object_mut() else {
        return Err(HierarchyError::reference(format!(
            "{} does not contain a mapping",
            path.display()
        )));
    };

    if let Some(nested) = fields.remove(REFERENCE_KEY) {
        warn!(
            "Ignoring nested reference {} in {}; references are resolved one level deep",
            nested,
            path.display()
        );
    }

    let mut merged = serde_json::to_value(&*node)?;
    overlay(&mut merged, fragment);
    if let Some(fields) = merged.as_object_mut() {
        fields.remove(REFERENCE_KEY);
    }

    *node = serde_json::from_value(merged).map_err(|e| {
        HierarchyError::reference(format!("Failed to merge {}: {e}", path.display()))
    })?;
    Ok(())
}

const REFERENCE_KEY: &str = "$ref";

/// Overlay `source` onto `target`, recursing into mappings present in both.
///
/// Field names are compared after normalisation so that `caChainName` in one
/// document and `ca_chain_name` in the other address the same field.
fn overlay(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_fields), Value::Object(source_fields)) => {
            for (key, value) in source_fields {
                let normalized = normalize_key(&key);
                let matching = target_fields
                    .keys()
                    .find(|k| normalize_key(k) == normalized)
                    .cloned();
                let existing = matching.and_then(|k| target_fields.remove(&k));

                match existing {
                    Some(mut current) if current.is_object() && value.is_object() => {
                        overlay(&mut current, value);
                        target_fields.insert(key, current);
                    }
                    _ => {
                        target_fields.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

fn normalize_key(key: &str) -> String {
    let normalized: String = key
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    // Leaves accept `is_ca_root_ca` for the root chain link flag.
    if normalized == "iscarootca" {
        "islastchainrootca".to_string()
    } else {
        normalized
    }
}

fn check_regular_file(path: &Path) -> std::result::Result<(), String> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| format!("The configuration file does not exist: {}", path.display()))?;

    if metadata.is_dir() {
        return Err(format!(
            "The configuration file {} is a directory",
            path.display()
        ));
    }

    Ok(())
}
