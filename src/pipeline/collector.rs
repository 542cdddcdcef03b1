use crate::config::ExecutionConfig;
use crate::model::{merge_references, unique, ReferenceMap, Resource};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Shared result set that every finished scan unit is merged into
///
/// The backing map is only reachable through [`Collector::merge`] and
/// [`Collector::snapshot`], both of which hold the single lock for their whole
/// duration. Scanning itself never takes this lock.
pub struct Collector {
    aliases: HashMap<String, String>,
    valid_names: HashSet<String>,
    resources: Mutex<BTreeMap<String, Resource>>,
}

impl Collector {
    pub fn new(aliases: HashMap<String, String>, valid_names: HashSet<String>) -> Self {
        Self {
            aliases,
            valid_names,
            resources: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.aliases.clone(), config.valid_names.clone())
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    fn accepts(&self, tag: &str) -> bool {
        self.valid_names.is_empty() || self.valid_names.contains(tag)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Resource>> {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Merges one scan unit's resource, keyed by its alias-resolved tag
    pub fn merge(&self, incoming: Resource) {
        let tag = self.resolve(&incoming.tag).to_string();

        let mut references = ReferenceMap::new();
        for (key, locations) in incoming.references {
            let key = self.resolve(&key).to_string();
            if key == tag {
                continue;
            }
            references.entry(key).or_default().extend(locations);
        }

        let mut resources = self.lock();

        let entry = resources.entry(tag.clone()).or_insert_with(|| Resource {
            tag: tag.clone(),
            ..Default::default()
        });
        merge_references(&mut entry.references, references, |k| self.accepts(k));
        let mut software = std::mem::take(&mut entry.software);
        software.extend(incoming.software);
        entry.software = unique(software);

        if !self.valid_names.is_empty() {
            let before = resources.len();
            resources.retain(|key, _| self.valid_names.contains(key));
            for resource in resources.values_mut() {
                resource
                    .references
                    .retain(|key, _| self.valid_names.contains(key));
            }
            if resources.len() < before {
                debug!(tag = %tag, purged = before - resources.len(), "Purged out-of-scope resources");
            }
        }
    }

    /// Copy of the current result set, ordered by tag
    pub fn snapshot(&self) -> Vec<Resource> {
        self.lock().values().cloned().collect()
    }
}
