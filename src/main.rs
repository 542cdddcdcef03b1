use reference_finder::cli::commands::{CliArgs, Commands};
use reference_finder::cli::handlers::{handle_analyze, handle_flowchart, handle_report};
use reference_finder::util::{init_logging, LoggingConfig};
use reference_finder::{NAME, VERSION};

use clap::Parser;
use std::process;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_args(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args).await,
        Commands::Flowchart(flowchart_args) => handle_flowchart(flowchart_args),
        Commands::Report(report_args) => handle_report(report_args),
    };

    process::exit(exit_code);
}
