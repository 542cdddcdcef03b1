pub mod commands;
pub mod handlers;

pub use commands::{AnalyzeArgs, CliArgs, Commands, FlowchartArgs, RenderFilterArgs, ReportArgs};
