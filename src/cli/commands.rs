use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cross-repository reference finder
#[derive(Parser, Debug)]
#[command(
    name = "reference-finder",
    about = "Find cross-repository references and render them as a graph or report",
    version,
    long_about = "reference-finder checks out a list of repositories, scans every file for a \
                  configurable reference pattern and records which repository points at which. \
                  The resulting JSON can be rendered as a Mermaid flowchart or a markdown report."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        visible_alias = "analyze-json",
        about = "Scan repositories and write the reference graph as JSON",
        long_about = "Clones (or reuses) every repository listed in the input file, scans it \
                      for references and writes the merged resource list.\n\n\
                      Examples:\n  \
                      reference-finder analyze\n  \
                      reference-finder analyze -i config.json"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Render a Mermaid flowchart from an analysis result",
        long_about = "Examples:\n  \
                      reference-finder flowchart\n  \
                      reference-finder flowchart -r orders -g groups.json --include-orphans"
    )]
    Flowchart(FlowchartArgs),

    #[command(about = "Render a markdown report from an analysis result")]
    Report(ReportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        short = 'i',
        long,
        value_name = "FILE",
        default_value = "config.json",
        help = "Analysis configuration file"
    )]
    pub config: PathBuf,
}

/// Filter and labelling inputs shared by both renderers
#[derive(Args, Debug, Clone, Default)]
pub struct RenderFilterArgs {
    #[arg(short = 'e', long, value_name = "FILE", help = "Tags to exclude, one per line")]
    pub exclude: Option<PathBuf>,

    #[arg(
        short = 'g',
        long = "group-definitions",
        value_name = "FILE",
        help = "JSON object of group name to member tags"
    )]
    pub group_definitions: Option<PathBuf>,

    #[arg(
        short = 'v',
        long = "valid-tags",
        value_name = "FILE",
        help = "Allowlist of tags, one per line"
    )]
    pub valid_tags: Option<PathBuf>,

    #[arg(
        short = 't',
        long,
        value_name = "FILE",
        help = "Display names, one `tag;label` per line"
    )]
    pub translation: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FlowchartArgs {
    #[arg(short = 'i', long, value_name = "FILE", default_value = "output.json")]
    pub input: PathBuf,

    #[arg(short = 'o', long, value_name = "FILE", default_value = "flowchart.txt")]
    pub output: PathBuf,

    #[arg(
        short = 'r',
        long,
        value_name = "TAG",
        help = "Only draw edges touching this resource"
    )]
    pub resource: Option<String>,

    #[arg(long, help = "Connect orphaned resources to a shared sink node")]
    pub include_orphans: bool,

    #[command(flatten)]
    pub filters: RenderFilterArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(short = 'i', long, value_name = "FILE", default_value = "output.json")]
    pub input: PathBuf,

    #[arg(short = 'o', long, value_name = "FILE", default_value = "REPORT.md")]
    pub output: PathBuf,

    #[command(flatten)]
    pub filters: RenderFilterArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let args = CliArgs::parse_from(["reference-finder", "analyze"]);
        match args.command {
            Commands::Analyze(analyze) => assert_eq!(analyze.config, PathBuf::from("config.json")),
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_json_alias() {
        let args = CliArgs::parse_from(["reference-finder", "analyze-json", "-i", "prod.json"]);
        match args.command {
            Commands::Analyze(analyze) => assert_eq!(analyze.config, PathBuf::from("prod.json")),
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_flowchart_defaults() {
        let args = CliArgs::parse_from(["reference-finder", "flowchart"]);
        match args.command {
            Commands::Flowchart(flowchart) => {
                assert_eq!(flowchart.input, PathBuf::from("output.json"));
                assert_eq!(flowchart.output, PathBuf::from("flowchart.txt"));
                assert!(flowchart.resource.is_none());
                assert!(!flowchart.include_orphans);
                assert!(flowchart.filters.exclude.is_none());
            }
            _ => panic!("Expected Flowchart command"),
        }
    }

    #[test]
    fn test_flowchart_with_options() {
        let args = CliArgs::parse_from([
            "reference-finder",
            "flowchart",
            "-r",
            "orders",
            "-e",
            "exclude.txt",
            "-g",
            "groups.json",
            "-v",
            "valid.txt",
            "-t",
            "names.txt",
            "--include-orphans",
        ]);
        match args.command {
            Commands::Flowchart(flowchart) => {
                assert_eq!(flowchart.resource.as_deref(), Some("orders"));
                assert!(flowchart.include_orphans);
                assert_eq!(flowchart.filters.exclude, Some(PathBuf::from("exclude.txt")));
                assert_eq!(
                    flowchart.filters.group_definitions,
                    Some(PathBuf::from("groups.json"))
                );
                assert_eq!(flowchart.filters.valid_tags, Some(PathBuf::from("valid.txt")));
                assert_eq!(flowchart.filters.translation, Some(PathBuf::from("names.txt")));
            }
            _ => panic!("Expected Flowchart command"),
        }
    }

    #[test]
    fn test_report_defaults() {
        let args = CliArgs::parse_from(["reference-finder", "report"]);
        match args.command {
            Commands::Report(report) => {
                assert_eq!(report.input, PathBuf::from("output.json"));
                assert_eq!(report.output, PathBuf::from("REPORT.md"));
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["reference-finder", "--verbose", "report"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["reference-finder", "report", "-q"]);
        assert!(args.quiet);

        let args = CliArgs::parse_from(["reference-finder", "--log-level", "debug", "analyze"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = CliArgs::try_parse_from(["reference-finder", "--verbose", "-q", "report"]);
        assert!(result.is_err());
    }
}
