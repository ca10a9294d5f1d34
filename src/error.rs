use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Convenience result type for writer operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Convenience result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience result type for a whole pipeline run.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by the loaders.
///
/// A single error enum shared across CSV/JSON (and optional Excel) loading. Every variant is
/// fatal to the run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel loading error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV loading error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON syntax error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The format is unknown, cannot be inferred, or is not compiled in.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// The input parsed but cannot be read as a table (no header row, not an array of objects...).
    #[error("malformed input: {message}")]
    Malformed { message: String },

    /// One or more configured source files do not exist.
    #[error("missing source files: {}", display_paths(paths))]
    MissingSources { paths: Vec<PathBuf> },
}

/// Error type returned by the writers.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Underlying I/O error (unwritable directory, failed rename, ...).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "excel")]
    /// Workbook serialization error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    /// The target format is unknown, cannot be inferred, or cannot be written.
    #[error("unsupported output format: {message}")]
    UnsupportedFormat { message: String },
}

/// Error type for reading and checking a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The configuration is not valid TOML or does not match the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is inconsistent.
    #[error("invalid config: {message}")]
    Invalid { message: String },
}

/// Fatal error of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected before any source was touched.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Pre-flight check failed (one or more sources missing).
    #[error(transparent)]
    Preflight(LoadError),

    /// A dataset could not be loaded.
    #[error("failed to load dataset '{dataset}': {error}")]
    Load {
        dataset: String,
        #[source]
        error: LoadError,
    },

    /// The consolidated table could not be written.
    #[error("failed to write output: {0}")]
    Write(#[from] WriteError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
