//! Subcommand handlers; each returns the process exit code

use super::commands::{AnalyzeArgs, FlowchartArgs, RenderFilterArgs, ReportArgs};
use crate::config::{ExecutionConfig, FinderConfig};
use crate::model::{load_resources, save_resources};
use crate::pipeline::{GitMaterializer, Orchestrator};
use crate::progress::LoggingHandler;
use crate::render::{build_flowchart, build_report, RenderOptions};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

fn exit_code(command: &str, result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!(command, "{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Replaces `path` with `content`
fn write_output(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing {}", path.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Saved output");
    Ok(())
}

fn render_options(filters: &RenderFilterArgs) -> Result<RenderOptions> {
    RenderOptions::load(
        filters.exclude.as_deref(),
        filters.valid_tags.as_deref(),
        filters.group_definitions.as_deref(),
        filters.translation.as_deref(),
    )
}

pub async fn handle_analyze(args: &AnalyzeArgs) -> i32 {
    exit_code("analyze", run_analyze(args).await)
}

async fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = FinderConfig::from_file(&args.config)?.with_env_overrides()?;
    debug!("{}", config);

    let execution = ExecutionConfig::load(&config)?;
    let materializer = Arc::new(GitMaterializer::new(&execution.workdir, execution.sync));

    let resources = Orchestrator::new(execution, materializer)
        .with_progress_handler(Arc::new(LoggingHandler))
        .execute()
        .await?;

    save_resources(&config.output, &resources)?;
    info!(path = %config.output.display(), resources = resources.len(), "Saved output");
    Ok(())
}

pub fn handle_flowchart(args: &FlowchartArgs) -> i32 {
    exit_code("flowchart", run_flowchart(args))
}

fn run_flowchart(args: &FlowchartArgs) -> Result<()> {
    let resources = load_resources(&args.input)?;
    let options = render_options(&args.filters)?;

    let chart = build_flowchart(
        &resources,
        args.resource.as_deref(),
        &options,
        args.include_orphans,
    );
    write_output(&args.output, &chart)
}

pub fn handle_report(args: &ReportArgs) -> i32 {
    exit_code("report", run_report(args))
}

fn run_report(args: &ReportArgs) -> Result<()> {
    let resources = load_resources(&args.input)?;
    let options = render_options(&args.filters)?;

    write_output(&args.output, &build_report(&resources, &options))
}
