//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while an analyze run makes progress
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { repositories: usize },

    /// A repository checkout is available on disk
    RepositoryReady { name: String, path: String },

    /// All repositories were expanded into scan units
    UnitsPlanned { units: usize },

    /// A worker picked up a scan unit
    ScanStarted { tag: String },

    /// A scan unit finished and was merged
    ScanComplete {
        tag: String,
        completed: usize,
        total: usize,
        duration: Duration,
    },

    /// Run completed successfully
    Completed {
        resources: usize,
        total_time: Duration,
    },

    /// Run aborted
    Failed { error: String },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
