//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser)]
#[command(
    name = "book-data-merge",
    version,
    about = "Clean and merge book-metadata datasets into one consolidated file",
    long_about = "Load book-metadata datasets (CSV, JSON, Excel), normalize them onto one canonical\n\
                  schema, drop invalid records, merge duplicates by dataset priority and write one\n\
                  consolidated CSV, JSON or XLSX file.\n\n\
                  Without --config the configuration compiled into the binary is used."
)]
pub struct Cli {
    /// Pipeline configuration (TOML). Replaces the built-in configuration.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the consolidated dataset here instead of the configured output path.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (default: configured format, else inferred from the output extension).
    #[arg(long = "output-format", value_enum)]
    pub output_format: Option<OutputFormatArg>,

    /// Run every stage and print the summary without writing the output file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Log output format (pretty for humans, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Csv,
    Json,
    Xlsx,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
