//! Turning a repository descriptor into a local checkout

use crate::model::Repository;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Failed to create working directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to run git for {repo}: {source}")]
    Spawn {
        repo: String,
        source: std::io::Error,
    },
    #[error("git clone of {repo} failed: {stderr}")]
    CloneFailed { repo: String, stderr: String },
    #[error("No checkout for {repo} at {path}")]
    Missing { repo: String, path: PathBuf },
}

/// Provides a local directory for a repository
#[async_trait]
pub trait RepositoryMaterializer: Send + Sync {
    async fn materialize(&self, repo: &Repository) -> Result<PathBuf, MaterializeError>;
}

/// Clones into `<workdir>/<name>` when absent and optionally pulls existing checkouts
pub struct GitMaterializer {
    workdir: PathBuf,
    sync: bool,
}

impl GitMaterializer {
    pub fn new(workdir: impl Into<PathBuf>, sync: bool) -> Self {
        Self {
            workdir: workdir.into(),
            sync,
        }
    }

    async fn clone_into(&self, repo: &Repository, path: &Path) -> Result<(), MaterializeError> {
        info!(repo = %repo.name, url = %repo.url, "Cloning repository");

        let output = Command::new("git")
            .arg("clone")
            .arg(&repo.url)
            .arg(path)
            .output()
            .await
            .map_err(|source| MaterializeError::Spawn {
                repo: repo.name.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(MaterializeError::CloneFailed {
                repo: repo.name.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// A stale checkout is still scannable, so pull failures only warn
    async fn pull(&self, repo: &Repository, path: &Path) {
        debug!(repo = %repo.name, "Pulling repository");

        match Command::new("git")
            .arg("pull")
            .current_dir(path)
            .output()
            .await
        {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                repo = %repo.name,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git pull failed, scanning existing checkout"
            ),
            Err(e) => warn!(repo = %repo.name, error = %e, "Failed to run git pull"),
        }
    }
}

#[async_trait]
impl RepositoryMaterializer for GitMaterializer {
    async fn materialize(&self, repo: &Repository) -> Result<PathBuf, MaterializeError> {
        fs::create_dir_all(&self.workdir)
            .await
            .map_err(|source| MaterializeError::WorkDir {
                path: self.workdir.clone(),
                source,
            })?;

        let path = self.workdir.join(&repo.name);
        if fs::try_exists(&path).await.unwrap_or(false) {
            if self.sync {
                self.pull(repo, &path).await;
            }
        } else {
            self.clone_into(repo, &path).await?;
        }

        Ok(path)
    }
}

/// Uses checkouts already present under the working directory; never touches the network
pub struct ExistingCheckout {
    workdir: PathBuf,
}

impl ExistingCheckout {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

#[async_trait]
impl RepositoryMaterializer for ExistingCheckout {
    async fn materialize(&self, repo: &Repository) -> Result<PathBuf, MaterializeError> {
        let path = self.workdir.join(&repo.name);
        if fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
            Ok(path)
        } else {
            Err(MaterializeError::Missing {
                repo: repo.name.clone(),
                path,
            })
        }
    }
}
