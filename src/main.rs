//! book-data-merge CLI.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;

use book_data_merge::config::PipelineConfig;
use book_data_merge::logging::{LogConfig, LogFormat, init_logging};
use book_data_merge::output::OutputFormat;
use book_data_merge::pipeline::{RunOptions, RunSummary, run};

mod cli;
mod summary;

use crate::cli::{Cli, LogFormatArg, OutputFormatArg};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match execute(&cli) {
        Ok(summary) => {
            print_summary(&summary);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn execute(cli: &Cli) -> Result<RunSummary> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => PipelineConfig::embedded().context("load built-in config")?,
    };
    if let Some(path) = &cli.output {
        config.output.path = path.clone();
    }
    if let Some(format) = cli.output_format {
        config.output.format = Some(match format {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Xlsx => OutputFormat::Xlsx,
        });
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        ..RunOptions::default()
    };
    let summary = run(&config, &options).context("pipeline run failed")?;
    Ok(summary)
}

/// Build logging configuration from CLI flags.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        log_file: cli.log_file.clone(),
        with_ansi: cli.log_file.is_none() && io::stderr().is_terminal(),
        ..LogConfig::default()
    }
}
