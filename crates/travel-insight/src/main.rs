//! CLI entry point for the travel-insight pipeline.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use travel_insight::{
    DatasetMode, MergeReport, MlReport, Pipeline, PipelineConfig, PipelineConfigBuilder,
    PipelineError, PipelineResult, PreprocessReport,
};

/// CLI-compatible dataset mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// Training split
    Training,
    /// Validation split
    Validation,
}

impl From<CliMode> for DatasetMode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::Training => DatasetMode::Training,
            CliMode::Validation => DatasetMode::Validation,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw tables of one survey year
    Preprocess {
        /// Survey year, e.g. 2022
        #[arg(short, long)]
        year: String,

        #[arg(short, long, value_enum, default_value = "training")]
        mode: CliMode,
    },

    /// Merge the preprocessed years into the per-trip feature table
    Merge {
        #[arg(short, long, value_enum, default_value = "training")]
        mode: CliMode,
    },

    /// Encode the feature table for model training
    Ml {
        #[arg(short, long, value_enum, default_value = "training")]
        mode: CliMode,
    },
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Per-trip feature table builder for travel-survey data",
    long_about = "Builds a labelled per-trip feature table from travel-survey tables.\n\n\
                  EXAMPLES:\n  \
                  # Clean both survey years, then merge and encode\n  \
                  travel-insight preprocess --year 2022 --mode training\n  \
                  travel-insight preprocess --year 2023 --mode training\n  \
                  travel-insight merge --mode training\n  \
                  travel-insight ml --mode training\n\n  \
                  # Custom locations\n  \
                  travel-insight --data-root data --output out merge --mode validation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file; flags below override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root holding <mode>/<year>/file_dir.json
    #[arg(short, long, global = true)]
    data_root: Option<PathBuf>,

    /// Output directory for every artifact
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Survey years to merge, comma separated
    #[arg(long, global = true, value_delimiter = ',')]
    years: Option<Vec<String>>,

    /// Number of most frequent codes kept per multi-value column
    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of the list of written files
    ///
    /// Disables all logs; only the stage report (or the error) is printed.
    #[arg(long, global = true)]
    json: bool,

    /// Do not write JSON reports next to the outputs
    #[arg(long, global = true)]
    no_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Report of whichever stage ran.
#[derive(Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
enum StageReport {
    Preprocess(PreprocessReport),
    Merge(MergeReport),
    Ml(MlReport),
}

impl StageReport {
    fn output_files(&self) -> Vec<&Path> {
        match self {
            Self::Preprocess(report) => report.output_files(),
            Self::Merge(report) => vec![report.output_file.as_path()],
            Self::Ml(report) => vec![report.output_file.as_path(), report.encoder_file.as_path()],
        }
    }
}

fn build_config(cli: &Cli) -> PipelineResult<PipelineConfig> {
    let base = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineConfigBuilder::from_config(base);
    if let Some(root) = &cli.data_root {
        builder = builder.data_root(root);
    }
    if let Some(output) = &cli.output {
        builder = builder.output_dir(output);
    }
    if let Some(years) = &cli.years {
        builder = builder.years(years.iter().map(|y| y.trim().to_string()));
    }
    if let Some(top_n) = cli.top_n {
        builder = builder.categorical_top_n(top_n);
    }
    if cli.no_report {
        builder = builder.emit_reports(false);
    }

    builder
        .build()
        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))
}

fn run(cli: &Cli) -> PipelineResult<StageReport> {
    let config = build_config(cli)?;
    let mut pipeline = Pipeline::builder()
        .config(config)
        .build()
        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

    let report = match &cli.command {
        Command::Preprocess { year, mode } => {
            StageReport::Preprocess(pipeline.preprocess((*mode).into(), year)?)
        }
        Command::Merge { mode } => StageReport::Merge(pipeline.merge((*mode).into())?),
        Command::Ml { mode } => StageReport::Ml(pipeline.ml((*mode).into())?),
    };
    Ok(report)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (disabled if --json is set)
    init_logging(&cli.log_level, cli.quiet, cli.json);

    match run(&cli) {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            info!("Done");
            println!("Output files:");
            for path in report.output_files() {
                println!("  - {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "success": false, "error": &e }))?
                );
            } else {
                error!("Pipeline failed: {}", e);
            }
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
