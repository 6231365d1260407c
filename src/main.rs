//! Command-line shell around the audit report pipeline.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use audit_report_mapper::config::PipelineConfig;
use audit_report_mapper::export::write_csv_to_path;
use audit_report_mapper::logging::{init_logging, LogConfig, LogFormat};
use audit_report_mapper::pipeline::Pipeline;
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(
    name = "audit-report-mapper",
    version,
    about = "Map an audit export onto the report schema",
    long_about = "Drops aborted visits and visits after the most recent Friday, sorts by \
                  category and visit time, reconciles equivalent survey questions and writes \
                  the report CSV."
)]
struct Cli {
    /// Exported audit CSV.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// JSON pipeline configuration (defaults to the built-in Asda mapping).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the report is written to.
    #[arg(long = "output-dir", value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Run date used to compute the cutoff Friday (defaults to today).
    #[arg(long = "run-date", value_name = "YYYY-MM-DD")]
    run_date: Option<NaiveDate>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "compact", global = true)]
    log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig {
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        log_file: cli.log_file.clone(),
        with_ansi: io::stderr().is_terminal(),
        ..LogConfig::from_verbosity(cli.verbose)
    };
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => PipelineConfig::asda().context("loading built-in configuration")?,
    };
    let today = cli.run_date.unwrap_or_else(|| Local::now().date_naive());

    let input = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run(&input, today)?;

    let out_path = output_path(&cli.output_dir, &pipeline.config().output_file_name);
    write_csv_to_path(&output.table, &out_path)
        .with_context(|| format!("writing {}", out_path.display()))?;

    let stats = output.stats;
    println!(
        "{} rows in, {} aborted, {} after {}, {} rows written to {} ({} warnings)",
        stats.rows_loaded,
        stats.aborted_removed,
        stats.after_cutoff_removed,
        stats.cutoff,
        stats.rows_out,
        out_path.display(),
        stats.warnings
    );
    Ok(())
}

fn output_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}
