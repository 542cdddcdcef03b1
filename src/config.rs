//! Run configuration for `analyze`
//!
//! Settings come from a JSON file, optionally overridden by environment
//! variables, and are resolved once into an [`ExecutionConfig`] before any
//! repository is touched.
//!
//! # Config file
//!
//! ```json
//! {
//!   "reg": "(?:http|https)://([a-zA-Z0-9-]+)(?:.dev|.demo){0,1}.service",
//!   "rootlike": ["platform-apps"],
//!   "concurrency": 8,
//!   "input": "repositories.json",
//!   "output": "output.json",
//!   "trimSuffix": "-service",
//!   "sync": false,
//!   "extendedSearch": false,
//!   "aliases": {"legacy-billing": "billing"},
//!   "workdir": "workdir"
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `REFFINDER_WORKDIR`: checkout cache directory - overrides `workdir`
//! - `REFFINDER_CONCURRENCY`: maximum simultaneous scans - overrides `concurrency`
//! - `REFFINDER_SYNC`: pull existing checkouts (true|false) - overrides `sync`

use crate::model::Repository;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_INPUT: &str = "repositories.json";
const DEFAULT_OUTPUT: &str = "output.json";
const DEFAULT_WORKDIR: &str = "workdir";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("Failed to parse json from file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Reference pattern is missing. Set \"reg\" in the config file")]
    MissingPattern,

    #[error("Invalid reference pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Reference pattern must have exactly one capture group, found {0}")]
    CaptureGroups(usize),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    EnvParse { field: String, error: String },
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_input() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT)
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_workdir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKDIR)
}

/// Settings as written in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderConfig {
    /// Extraction pattern with exactly one capture group
    #[serde(rename = "reg", default)]
    pub reference_pattern: String,

    /// Repositories whose immediate subdirectories are scanned as separate units
    #[serde(rename = "rootlike", default)]
    pub root_like: Vec<String>,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Repository list (`[{"url": ..., "name": ...}]`)
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Where the resource list is written
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Suffix removed from every captured tag
    #[serde(default)]
    pub trim_suffix: String,

    /// Pull already materialized checkouts before scanning
    #[serde(default)]
    pub sync: bool,

    /// Keep reference targets outside the repository list
    #[serde(default)]
    pub extended_search: bool,

    /// Raw name to canonical tag
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Checkout cache, reused between runs
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            reference_pattern: String::new(),
            root_like: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            input: default_input(),
            output: default_output(),
            trim_suffix: String::new(),
            sync: false,
            extended_search: false,
            aliases: HashMap::new(),
            workdir: default_workdir(),
        }
    }
}

impl FinderConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&data).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `REFFINDER_*` overrides on top of the file values
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(workdir) = env::var("REFFINDER_WORKDIR") {
            self.workdir = PathBuf::from(workdir);
        }

        if let Ok(value) = env::var("REFFINDER_CONCURRENCY") {
            self.concurrency = value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::EnvParse {
                    field: "REFFINDER_CONCURRENCY".to_string(),
                    error: e.to_string(),
                }
            })?;
        }

        if let Ok(value) = env::var("REFFINDER_SYNC") {
            self.sync = value.parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::EnvParse {
                    field: "REFFINDER_SYNC".to_string(),
                    error: e.to_string(),
                }
            })?;
        }

        Ok(self)
    }

    /// Checks the settings and compiles the extraction pattern
    pub fn compile_pattern(&self) -> Result<Regex, ConfigError> {
        if self.reference_pattern.is_empty() {
            return Err(ConfigError::MissingPattern);
        }

        let pattern = Regex::new(&self.reference_pattern)?;

        // captures_len counts the implicit whole-match group
        let groups = pattern.captures_len() - 1;
        if groups != 1 {
            return Err(ConfigError::CaptureGroups(groups));
        }

        Ok(pattern)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile_pattern()?;

        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "Concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference Finder Configuration:")?;
        writeln!(f, "  Pattern: {}", self.reference_pattern)?;
        writeln!(f, "  Root-like: {:?}", self.root_like)?;
        writeln!(f, "  Concurrency: {}", self.concurrency)?;
        writeln!(f, "  Input: {}", self.input.display())?;
        writeln!(f, "  Output: {}", self.output.display())?;
        writeln!(f, "  Work Dir: {}", self.workdir.display())?;
        writeln!(f, "  Trim Suffix: {}", self.trim_suffix)?;
        writeln!(f, "  Sync: {}", self.sync)?;
        writeln!(f, "  Extended Search: {}", self.extended_search)?;
        writeln!(f, "  Aliases: {}", self.aliases.len())?;
        Ok(())
    }
}

/// Reads the repository list
pub fn load_repositories(path: &Path) -> Result<Vec<Repository>, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&data).map_err(|source| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolved run parameters, built once and then shared read-only
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub pattern: Regex,
    pub repositories: Vec<Repository>,
    pub aliases: HashMap<String, String>,
    pub root_like: HashSet<String>,
    pub concurrency: usize,
    pub extended_search: bool,
    pub trim_suffix: String,
    pub sync: bool,
    pub workdir: PathBuf,
    /// Acceptable reference targets; empty when extended search is on
    pub valid_names: HashSet<String>,
}

impl ExecutionConfig {
    /// Validates `config` and loads the repository list it points at
    pub fn load(config: &FinderConfig) -> Result<Self, ConfigError> {
        let repositories = load_repositories(&config.input)?;
        Self::from_parts(config, repositories)
    }

    pub fn from_parts(
        config: &FinderConfig,
        repositories: Vec<Repository>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let pattern = config.compile_pattern()?;

        let mut exec = Self {
            pattern,
            repositories,
            aliases: config.aliases.clone(),
            root_like: config.root_like.iter().cloned().collect(),
            concurrency: config.concurrency,
            extended_search: config.extended_search,
            trim_suffix: config.trim_suffix.clone(),
            sync: config.sync,
            workdir: config.workdir.clone(),
            valid_names: HashSet::new(),
        };

        if !exec.extended_search {
            exec.valid_names = exec
                .repositories
                .iter()
                .flat_map(|r| [r.name.clone(), exec.resolve_alias(&r.name).to_string()])
                .collect();

            // Raw spellings of a valid name survive the scan and are resolved on merge
            let raw_aliases: Vec<String> = exec
                .aliases
                .iter()
                .filter(|(_, target)| exec.valid_names.contains(*target))
                .map(|(raw, _)| raw.clone())
                .collect();
            exec.valid_names.extend(raw_aliases);
        }

        Ok(exec)
    }

    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_root_like(&self, name: &str) -> bool {
        self.root_like.contains(name)
    }
}
