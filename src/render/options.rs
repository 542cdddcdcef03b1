use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// A named group and the tags it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    pub name: String,
    pub members: Vec<String>,
}

impl GroupDefinition {
    pub fn contains(&self, tag: &str) -> bool {
        self.members.iter().any(|m| m == tag)
    }
}

/// Filters, grouping and labels shared by the flowchart and report renderers
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub exclude: HashSet<String>,
    /// Allowlist of tags; empty means every tag is allowed
    pub valid_tags: HashSet<String>,
    /// Groups in definition order
    pub groups: Vec<GroupDefinition>,
    pub translations: HashMap<String, String>,
}

impl RenderOptions {
    /// Loads each optional input file; `None` leaves that part empty
    pub fn load(
        exclude: Option<&Path>,
        valid_tags: Option<&Path>,
        groups: Option<&Path>,
        translations: Option<&Path>,
    ) -> Result<Self> {
        let mut options = Self::default();
        if let Some(path) = exclude {
            options.exclude = read_lines(path)?.into_iter().collect();
        }
        if let Some(path) = valid_tags {
            options.valid_tags = read_lines(path)?.into_iter().collect();
        }
        if let Some(path) = groups {
            options.groups = read_groups(path)?;
        }
        if let Some(path) = translations {
            options.translations = read_translations(path)?;
        }
        Ok(options)
    }

    /// True when `tag` is neither excluded nor missing from a non-empty allowlist
    pub fn passes(&self, tag: &str) -> bool {
        !self.exclude.contains(tag) && (self.valid_tags.is_empty() || self.valid_tags.contains(tag))
    }

    /// First group containing `tag`, in definition order
    pub fn group_of(&self, tag: &str) -> Option<&GroupDefinition> {
        self.groups.iter().find(|g| g.contains(tag))
    }

    pub fn groups_containing<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a GroupDefinition> + 'a {
        self.groups.iter().filter(move |g| g.contains(tag))
    }

    pub fn label<'a>(&'a self, tag: &'a str) -> &'a str {
        self.translations.get(tag).map(String::as_str).unwrap_or(tag)
    }
}

/// Non-empty trimmed lines of a text file
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reads a JSON object of group name to member tags, keeping key order
pub fn read_groups(path: &Path) -> Result<Vec<GroupDefinition>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;
    let raw: Map<String, Value> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse json from file {}", path.display()))?;

    raw.into_iter()
        .map(|(name, members)| {
            let members: Vec<String> = serde_json::from_value(members)
                .with_context(|| format!("Group {} in {} is not a list of tags", name, path.display()))?;
            Ok::<_, anyhow::Error>(GroupDefinition { name, members })
        })
        .collect()
}

/// Reads `tag;label` lines; fields after the second `;` are ignored
pub fn read_translations(path: &Path) -> Result<HashMap<String, String>> {
    let mut translations = HashMap::new();
    for (index, line) in read_lines(path)?.into_iter().enumerate() {
        let mut fields = line.split(';');
        let (Some(tag), Some(label)) = (fields.next(), fields.next()) else {
            bail!(
                "Invalid translation on line {} of {}: expected `tag;label`",
                index + 1,
                path.display()
            );
        };
        translations.insert(tag.trim().to_string(), label.trim().to_string());
    }
    Ok(translations)
}
