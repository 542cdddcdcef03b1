//! reference-finder - cross-repository reference discovery
//!
//! Scans a set of repository checkouts for a configurable textual pattern,
//! merges what each repository points at into one dependency graph and renders
//! that graph as a Mermaid flowchart or a markdown report.
//!
//! # Core Concepts
//!
//! - **Scan unit**: a whole repository, or one immediate subdirectory of a
//!   root-like repository. Each unit becomes one [`Resource`].
//! - **Reference**: the single capture group of the configured pattern, with
//!   a `path:line` provenance string for every place it was seen.
//! - **Valid names**: unless extended search is on, references are kept only
//!   when they point at a configured repository (or its alias).
//!
//! # Example Usage
//!
//! ```no_run
//! use reference_finder::{ExecutionConfig, FinderConfig, GitMaterializer, Orchestrator};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = FinderConfig::from_file(Path::new("config.json"))?;
//! let execution = ExecutionConfig::load(&config)?;
//! let materializer = Arc::new(GitMaterializer::new(&execution.workdir, execution.sync));
//!
//! let resources = Orchestrator::new(execution, materializer).execute().await?;
//! for resource in &resources {
//!     println!("{} -> {:?}", resource.tag, resource.references.keys());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`config`]: run configuration and repository list
//! - [`extract`]: per-line reference extraction and software detectors
//! - [`scan`]: directory walk for one scan unit
//! - [`pipeline`]: checkout, bounded-concurrency scanning and merging
//! - [`render`]: flowchart and report output

pub mod cli;
pub mod config;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod scan;
pub mod util;

pub use config::{ConfigError, ExecutionConfig, FinderConfig};
pub use extract::{Reference, ReferenceExtractor};
pub use model::{Findings, ReferenceMap, Repository, Resource};
pub use pipeline::{Collector, ExistingCheckout, GitMaterializer, Orchestrator, RepositoryMaterializer};
pub use render::{build_flowchart, build_report, RenderOptions};
pub use scan::{ResourceScanner, ScanError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
