//! `book-data-merge` cleans book-metadata datasets and merges them into one consolidated table.
//!
//! A run is strictly linear: every configured dataset is loaded into an untyped
//! [`types::DataSet`], normalized onto the canonical schema, validated, and then all valid
//! records are grouped by merge key and resolved field-by-field by dataset priority. The result
//! is written atomically as CSV, JSON or XLSX.
//!
//! The primary entrypoint is [`pipeline::run`], driven by a [`config::PipelineConfig`].
//!
//! ## What you can load
//!
//! **File formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv`
//! - **JSON**: `.json` (array of objects)
//! - **Excel/workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`
//!
//! Across formats, empty cells, whitespace-only strings and JSON `null` load as
//! [`types::Value::Null`], the only missing marker.
//!
//! ## Quick example: run a configuration
//!
//! ```no_run
//! use book_data_merge::config::PipelineConfig;
//! use book_data_merge::pipeline::{run, RunOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_path("books.toml")?;
//! let summary = run(&config, &RunOptions::default())?;
//! println!("wrote {} records to {}", summary.output_rows, summary.output_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified loading entrypoint and format-specific loaders
//! - [`canonical`]: canonical schema and per-field coercion rules
//! - [`isbn`]: ISBN canonicalization and check digits
//! - [`processing`]: normalize, validate, merge
//! - [`output`]: atomic CSV/JSON/XLSX writers
//! - [`pipeline`]: the end-to-end run
//! - [`config`]: TOML configuration
//! - [`observability`]: pipeline event observers
//! - [`logging`]: `tracing` subscriber setup
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: error types

pub mod canonical;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod isbn;
pub mod logging;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{ConfigError, LoadError, PipelineError, WriteError};
