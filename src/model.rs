//! Core data model shared by the scanning and rendering halves of the tool
//!
//! The resource list is the only artifact passed from `analyze` to the
//! renderers, so its JSON shape is the interchange contract:
//!
//! ```json
//! [{"tag": "orders", "references": {"billing": ["/orders/src/app.yml:12"]}, "software": ["Java 17"]}]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Referenced tag mapped to the `path:line` locations where it was found
pub type ReferenceMap = BTreeMap<String, Vec<String>>;

/// An external source location as listed in the repository input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
    pub name: String,
}

/// A scanned unit after alias resolution and merging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub tag: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: ReferenceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub software: Vec<String>,
}

// Older result files carry `null` for empty collections.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Resource {
    pub fn new(tag: impl Into<String>, findings: Findings) -> Self {
        Self {
            tag: tag.into(),
            references: findings.references,
            software: findings.software,
        }
    }
}

/// Per-unit scan result, owned by the worker that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub references: ReferenceMap,
    pub software: Vec<String>,
}

impl Findings {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.software.is_empty()
    }
}

/// Removes duplicates while keeping the first occurrence of each value
pub fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Unions `incoming` into `target` key-wise, concatenating then deduplicating
/// provenance lists. Keys rejected by `accept` are dropped from both sides.
pub fn merge_references<F>(target: &mut ReferenceMap, incoming: ReferenceMap, accept: F)
where
    F: Fn(&str) -> bool,
{
    target.retain(|key, _| accept(key));

    for (key, locations) in incoming {
        if !accept(&key) {
            continue;
        }
        let entry = target.entry(key).or_default();
        entry.extend(locations);
        let deduped = unique(std::mem::take(entry));
        *entry = deduped;
    }
}

/// Writes the resource list as pretty-printed JSON, replacing any existing file
pub fn save_resources(path: &Path, resources: &[Resource]) -> Result<()> {
    let json =
        serde_json::to_string_pretty(resources).context("Failed to serialize resource list")?;

    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to replace output file {}", path.display()))?;
    }
    fs::write(path, json)
        .with_context(|| format!("Failed to write output file {}", path.display()))?;
    Ok(())
}

/// Reads a resource list previously written by [`save_resources`]
pub fn load_resources(path: &Path) -> Result<Vec<Resource>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;

    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse json from file {}", path.display()))
}
