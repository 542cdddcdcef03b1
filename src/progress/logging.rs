//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { repositories } => {
                info!(repositories, "Entries to process");
            }
            ProgressEvent::RepositoryReady { name, path } => {
                debug!(repo = %name, path = %path, "Repository ready");
            }
            ProgressEvent::UnitsPlanned { units } => {
                info!(units, "Scan units planned");
            }
            ProgressEvent::ScanStarted { tag } => {
                debug!(tag = %tag, "Scanning");
            }
            ProgressEvent::ScanComplete {
                tag,
                completed,
                total,
                duration,
            } => {
                info!(
                    tag = %tag,
                    progress = format!("{}/{}", completed, total),
                    duration_ms = duration.as_millis(),
                    "Processed"
                );
            }
            ProgressEvent::Completed {
                resources,
                total_time,
            } => {
                info!(
                    resources,
                    total_time_ms = total_time.as_millis(),
                    "Analysis complete"
                );
            }
            ProgressEvent::Failed { error } => {
                error!(error = %error, "Analysis failed");
            }
        }
    }
}
