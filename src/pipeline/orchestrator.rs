use super::collector::Collector;
use super::materialize::RepositoryMaterializer;
use crate::config::ExecutionConfig;
use crate::extract::{ReferenceExtractor, SoftwareDetectors};
use crate::model::{Repository, Resource};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::scan::ResourceScanner;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// One directory scanned as one logical resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanUnit {
    pub tag: String,
    pub path: PathBuf,
    pub repository: String,
}

/// Drives an analyze run: materialize, plan, scan, merge
///
/// Both the materialize and scan stages run at most `concurrency` tasks at
/// once. The run returns only after every spawned task has finished; the first
/// failure aborts the remaining tasks and fails the run.
pub struct Orchestrator {
    config: Arc<ExecutionConfig>,
    materializer: Arc<dyn RepositoryMaterializer>,
    scanner: Arc<ResourceScanner>,
    progress: Arc<dyn ProgressHandler>,
}

impl Orchestrator {
    pub fn new(config: ExecutionConfig, materializer: Arc<dyn RepositoryMaterializer>) -> Self {
        let scanner = Arc::new(build_scanner(&config));
        Self {
            config: Arc::new(config),
            materializer,
            scanner,
            progress: Arc::new(NoOpHandler),
        }
    }

    /// Replaces the default software detectors used by every scan unit
    pub fn with_detectors(mut self, detectors: SoftwareDetectors) -> Self {
        self.scanner = Arc::new(build_scanner(&self.config).with_detectors(detectors));
        self
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub async fn execute(&self) -> Result<Vec<Resource>> {
        let start = Instant::now();
        info!(
            repositories = self.config.repositories.len(),
            concurrency = self.config.concurrency,
            extended_search = self.config.extended_search,
            "Starting analysis"
        );
        self.progress.on_progress(&ProgressEvent::Started {
            repositories: self.config.repositories.len(),
        });

        match self.run().await {
            Ok(resources) => {
                self.progress.on_progress(&ProgressEvent::Completed {
                    resources: resources.len(),
                    total_time: start.elapsed(),
                });
                Ok(resources)
            }
            Err(e) => {
                self.progress.on_progress(&ProgressEvent::Failed {
                    error: format!("{:#}", e),
                });
                Err(e)
            }
        }
    }

    async fn run(&self) -> Result<Vec<Resource>> {
        let checkouts = self.materialize_all().await?;
        let units = self.plan_units(&checkouts).await?;
        self.progress
            .on_progress(&ProgressEvent::UnitsPlanned { units: units.len() });

        let collector = Arc::new(Collector::from_config(&self.config));
        self.scan_all(units, Arc::clone(&collector)).await?;

        Ok(collector.snapshot())
    }

    async fn materialize_all(&self) -> Result<Vec<(Repository, PathBuf)>> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for (index, repo) in self.config.repositories.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let materializer = Arc::clone(&self.materializer);
            let progress = Arc::clone(&self.progress);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                let path = materializer
                    .materialize(&repo)
                    .await
                    .with_context(|| format!("Failed to materialize repository {}", repo.name))?;
                progress.on_progress(&ProgressEvent::RepositoryReady {
                    name: repo.name.clone(),
                    path: path.display().to_string(),
                });
                Ok::<_, anyhow::Error>((index, repo, path))
            });
        }

        let mut checkouts = Vec::with_capacity(self.config.repositories.len());
        while let Some(joined) = tasks.join_next().await {
            match joined.context("Materialize task panicked").and_then(|r| r) {
                Ok(checkout) => checkouts.push(checkout),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        checkouts.sort_by_key(|(index, _, _)| *index);
        Ok(checkouts
            .into_iter()
            .map(|(_, repo, path)| (repo, path))
            .collect())
    }

    /// Expands checkouts into scan units; root-like repositories yield one
    /// unit per visible immediate subdirectory, in name order
    pub async fn plan_units(&self, checkouts: &[(Repository, PathBuf)]) -> Result<Vec<ScanUnit>> {
        let mut units = Vec::new();

        for (repo, path) in checkouts {
            if !self.config.is_root_like(&repo.name) {
                units.push(ScanUnit {
                    tag: self.config.resolve_alias(&repo.name).to_string(),
                    path: path.clone(),
                    repository: repo.name.clone(),
                });
                continue;
            }

            let mut subdirs = Vec::new();
            let mut entries = fs::read_dir(path)
                .await
                .with_context(|| format!("Failed to list root-like repository {}", path.display()))?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') || !entry.file_type().await?.is_dir() {
                    continue;
                }
                subdirs.push(name);
            }
            subdirs.sort();

            for name in subdirs {
                let tag = self.config.resolve_alias(&name).to_string();
                if !self.config.extended_search && !self.config.valid_names.contains(&tag) {
                    debug!(repo = %repo.name, unit = %name, "Skipping unlisted subdirectory");
                    continue;
                }
                units.push(ScanUnit {
                    tag,
                    path: path.join(&name),
                    repository: repo.name.clone(),
                });
            }
        }

        Ok(units)
    }

    async fn scan_all(&self, units: Vec<ScanUnit>, collector: Arc<Collector>) -> Result<()> {
        let total = units.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for unit in units {
            let scanner = Arc::clone(&self.scanner);
            let semaphore = Arc::clone(&semaphore);
            let collector = Arc::clone(&collector);
            let completed = Arc::clone(&completed);
            let progress = Arc::clone(&self.progress);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                progress.on_progress(&ProgressEvent::ScanStarted {
                    tag: unit.tag.clone(),
                });
                let started = Instant::now();

                let ScanUnit { tag, path, .. } = unit;
                let scan_tag = tag.clone();
                let findings = tokio::task::spawn_blocking(move || scanner.scan(&scan_tag, &path))
                    .await
                    .context("Scan task panicked")?
                    .with_context(|| format!("Failed to scan {}", tag))?;

                collector.merge(Resource::new(tag.clone(), findings));

                progress.on_progress(&ProgressEvent::ScanComplete {
                    tag,
                    completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
                    total,
                    duration: started.elapsed(),
                });
                Ok::<_, anyhow::Error>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined.context("Scan task panicked").and_then(|r| r) {
                tasks.abort_all();
                return Err(e);
            }
        }

        Ok(())
    }
}

fn build_scanner(config: &ExecutionConfig) -> ResourceScanner {
    let extractor = ReferenceExtractor::new(config.pattern.clone())
        .with_trim_suffix(config.trim_suffix.clone())
        .with_strip_prefix(config.workdir.clone());
    ResourceScanner::new(extractor).with_valid_names(config.valid_names.clone())
}
