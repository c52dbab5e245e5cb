//! CLI command definitions for bench-report.
//!
//! Builds reports from a finished benchmark run and its trace dump,
//! regenerates summaries from saved task metadata, and inspects single traces.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use crate::benchmark::{BenchmarkRun, ReportBuilder};
use crate::config::ReportConfig;
use crate::report::{load_task_results, ModelSummary, ReportWriter};
use crate::results::EvaluationReport;
use crate::trace::{MemoryTraceStore, SpanClassifier, TraceWalker};

/// Benchmark trace analysis and report generation.
#[derive(Parser)]
#[command(name = "bench-report")]
#[command(about = "Analyze benchmark traces and write run reports")]
#[command(version)]
#[command(
    long_about = "bench-report turns a finished benchmark run into a Markdown report and a JSON model summary.\n\nExample usage:\n  bench-report report --run run.json --traces traces.json --output-dir ./log"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Build the Markdown report and JSON summary for a run.
    Report(ReportArgs),

    /// Regenerate the JSON summary from saved meta.json files.
    ///
    /// Useful for runs that were resumed: every task's metadata is loaded
    /// from the results directory and the summary is rebuilt from scratch.
    Summary(SummaryArgs),

    /// Print the analysis of a single trace as JSON.
    Inspect(InspectArgs),
}

/// Output settings shared by commands that write artifacts.
#[derive(Parser, Debug, Default)]
pub struct OutputArgs {
    /// YAML configuration file. Environment variables are used when absent.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base output directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Run-specific subdirectory of the output directory.
    #[arg(long)]
    pub run_dir: Option<String>,

    /// JSON summary file name.
    #[arg(long)]
    pub summary_name: Option<String>,
}

impl OutputArgs {
    /// Resolves configuration: file or environment, then flags.
    fn resolve(&self) -> anyhow::Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ReportConfig::from_env()?,
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(run_dir) = &self.run_dir {
            config.run_dir = Some(run_dir.clone());
        }
        if let Some(name) = &self.summary_name {
            config.summary_name = Some(name.clone());
        }
        Ok(config)
    }
}

/// Arguments for `bench-report report`.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Benchmark run description (JSON).
    #[arg(short, long)]
    pub run: PathBuf,

    /// Trace dump (JSON object of trace id to spans).
    #[arg(short, long)]
    pub traces: Option<PathBuf>,

    /// Markdown report file name.
    #[arg(long)]
    pub report_name: Option<String>,

    /// Prompt whose leading characters mark summary model calls.
    #[arg(long)]
    pub summary_prompt: Option<String>,

    /// Print the JSON summary to stdout.
    #[arg(short = 'j', long)]
    pub json: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `bench-report summary`.
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Directory holding per-task meta.json files.
    #[arg(short = 'd', long)]
    pub results_dir: PathBuf,

    /// Model name recorded in the summary.
    #[arg(short, long, default_value = "unknown")]
    pub model_name: String,

    /// Model configuration as a JSON object.
    #[arg(long)]
    pub model_config: Option<String>,

    /// Print the JSON summary to stdout.
    #[arg(short = 'j', long)]
    pub json: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `bench-report inspect`.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Trace dump (JSON object of trace id to spans).
    #[arg(short, long)]
    pub traces: PathBuf,

    /// Trace id to analyze.
    pub trace_id: String,

    /// Prompt whose leading characters mark summary model calls.
    #[arg(long)]
    pub summary_prompt: Option<String>,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Report(args) => run_report_command(args).await,
        Commands::Summary(args) => run_summary_command(args).await,
        Commands::Inspect(args) => run_inspect_command(args),
    }
}

async fn run_report_command(args: ReportArgs) -> anyhow::Result<()> {
    let mut config = args.output.resolve()?;
    if let Some(name) = args.report_name {
        config.report_name = Some(name);
    }
    if let Some(prompt) = args.summary_prompt {
        config.summary_prompt = prompt;
    }
    config.validate()?;

    let run = BenchmarkRun::from_json_file(&args.run)
        .with_context(|| format!("Failed to load run {}", args.run.display()))?;
    let store = match &args.traces {
        Some(path) => MemoryTraceStore::from_json_file(path)?,
        None => {
            warn!("No trace dump given; trace statistics will be zero");
            MemoryTraceStore::new()
        }
    };

    let report = ReportBuilder::new(&store)
        .with_classifier(SpanClassifier::with_summary_prompt(&config.summary_prompt))
        .build(&run)?;

    let writer = ReportWriter::from_config(&config);
    writer.prepare().await;
    if config.write_markdown {
        match writer.write_report(&report).await {
            Some(path) => info!(path = %path.display(), "Report written"),
            None => warn!("Report was not written"),
        }
    }
    if config.write_summary {
        match writer.write_summary(&report.evaluation).await {
            Some(path) => info!(path = %path.display(), "Summary written"),
            None => warn!("Summary was not written"),
        }
    }

    if args.json {
        println!("{}", ModelSummary::from_report(&report.evaluation).to_json()?);
    }
    Ok(())
}

async fn run_summary_command(args: SummaryArgs) -> anyhow::Result<()> {
    let config = args.output.resolve()?;
    config.validate()?;

    let model_config: Value = match &args.model_config {
        Some(raw) => serde_json::from_str(raw).context("Invalid --model-config JSON")?,
        None => Value::Object(Default::default()),
    };

    let results = load_task_results(&args.results_dir).await;
    if results.is_empty() {
        bail!("No task metadata found under {}", args.results_dir.display());
    }
    info!(tasks = results.len(), "Loaded task results");

    let evaluation = EvaluationReport::new(args.model_name, model_config, results);
    let writer = ReportWriter::from_config(&config);
    if config.write_summary {
        match writer.write_summary(&evaluation).await {
            Some(path) => info!(path = %path.display(), "Summary written"),
            None => warn!("Summary was not written"),
        }
    }

    if args.json {
        println!("{}", ModelSummary::from_report(&evaluation).to_json()?);
    }
    Ok(())
}

fn run_inspect_command(args: InspectArgs) -> anyhow::Result<()> {
    let store = MemoryTraceStore::from_json_file(&args.traces)?;
    let classifier = match &args.summary_prompt {
        Some(prompt) => SpanClassifier::with_summary_prompt(prompt),
        None => SpanClassifier::default(),
    };

    let analysis = TraceWalker::new(&store, classifier).analyze(&args.trace_id);
    if analysis.is_empty() {
        warn!(trace_id = %args.trace_id, "Trace has no spans");
    }
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_report_command() {
        let cli = Cli::try_parse_from([
            "bench-report",
            "report",
            "--run",
            "run.json",
            "-t",
            "traces.json",
            "--output-dir",
            "out",
            "--run-dir",
            "nightly",
            "-j",
        ])
        .expect("should parse");

        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.run, PathBuf::from("run.json"));
                assert_eq!(args.traces, Some(PathBuf::from("traces.json")));
                assert_eq!(args.output.output_dir, Some(PathBuf::from("out")));
                assert_eq!(args.output.run_dir.as_deref(), Some("nightly"));
                assert!(args.json);
                assert!(args.report_name.is_none());
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_summary_command_defaults() {
        let cli = Cli::try_parse_from(["bench-report", "summary", "-d", "results"])
            .expect("should parse");

        match cli.command {
            Commands::Summary(args) => {
                assert_eq!(args.results_dir, PathBuf::from("results"));
                assert_eq!(args.model_name, "unknown");
                assert!(args.model_config.is_none());
                assert!(!args.json);
            }
            _ => panic!("Expected Summary command"),
        }
    }

    #[test]
    fn test_inspect_command() {
        let cli = Cli::try_parse_from([
            "bench-report",
            "--log-level",
            "debug",
            "inspect",
            "--traces",
            "traces.json",
            "abc-123",
        ])
        .expect("should parse");

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Inspect(args) => assert_eq!(args.trace_id, "abc-123"),
            _ => panic!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_report_requires_run() {
        assert!(Cli::try_parse_from(["bench-report", "report"]).is_err());
    }

    #[test]
    fn test_output_args_override_config() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("report.yaml");
        std::fs::write(&path, "output_dir: from-file\nrun_dir: file-run\n").unwrap();

        let args = OutputArgs {
            config: Some(path),
            output_dir: Some(PathBuf::from("from-flag")),
            run_dir: None,
            summary_name: Some("s.json".to_string()),
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.output_dir, PathBuf::from("from-flag"));
        assert_eq!(config.run_dir.as_deref(), Some("file-run"));
        assert_eq!(config.summary_name.as_deref(), Some("s.json"));
    }
}
