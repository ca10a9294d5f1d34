//! Unified loading entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which loads a file into an untyped in-memory
//! [`crate::types::DataSet`].
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - If a [`PipelineObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{LoadError, LoadResult};
use crate::observability::{LoadContext, LoadStats, PipelineObserver, Severity};
use crate::types::DataSet;

use super::{csv, json};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array of objects.
    Json,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    #[serde(alias = "xlsx", alias = "xls", alias = "ods")]
    Excel,
}

impl IngestionFormat {
    /// Parse an input format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Format inferred from the extension of `path`.
    pub fn from_path(path: &Path) -> LoadResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoadError::UnsupportedFormat {
                message: format!(
                    "cannot infer format: path has no extension ({})",
                    path.display()
                ),
            })?;

        Self::from_extension(ext).ok_or_else(|| LoadError::UnsupportedFormat {
            message: format!(
                "cannot infer format from extension '{ext}' for path ({})",
                path.display()
            ),
        })
    }
}

/// Which sheet to read from an Excel workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExcelSheetSelection {
    /// The first sheet (default).
    #[default]
    First,
    /// A single named sheet.
    Sheet(String),
}

/// Options controlling unified loading.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            excel_sheet_selection: ExcelSheetSelection::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Load one dataset from `path`.
///
/// When an observer is configured, this function reports:
///
/// - `on_loaded` on success, with row/column counts
/// - `on_load_failed` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// Format inference failures are returned before any observer call, since there is no format
/// to report.
///
/// # Examples
///
/// ```no_run
/// use book_data_merge::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), book_data_merge::LoadError> {
/// // Uses `.csv` to select CSV loading.
/// let ds = ingest_from_path("books.csv", &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
///
/// Force a format and pick a worksheet:
///
/// ```no_run
/// use book_data_merge::ingestion::{
///     ingest_from_path, ExcelSheetSelection, IngestionFormat, IngestionOptions,
/// };
///
/// # fn main() -> Result<(), book_data_merge::LoadError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Excel),
///     excel_sheet_selection: ExcelSheetSelection::Sheet("Books".to_string()),
///     ..Default::default()
/// };
/// let ds = ingest_from_path("catalogue.xlsx", &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> LoadResult<DataSet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => IngestionFormat::from_path(path)?,
    };

    let ctx = LoadContext {
        path: path.to_path_buf(),
        format: fmt,
    };

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path),
        IngestionFormat::Json => json::ingest_json_from_path(path),
        IngestionFormat::Excel => ingest_excel_dispatch(path, &options.excel_sheet_selection),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => obs.on_loaded(
                &ctx,
                LoadStats {
                    rows: ds.row_count(),
                    columns: ds.schema.len(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_load_failed(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &LoadError) -> Severity {
    match e {
        LoadError::Io(_) | LoadError::MissingSources { .. } => Severity::Critical,
        LoadError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        LoadError::Json(err) if err.is_io() => Severity::Critical,
        LoadError::Json(_) => Severity::Error,
        #[cfg(feature = "excel")]
        LoadError::Excel(_) => Severity::Error,
        LoadError::UnsupportedFormat { .. } | LoadError::Malformed { .. } => Severity::Error,
    }
}

fn ingest_excel_dispatch(path: &Path, sel: &ExcelSheetSelection) -> LoadResult<DataSet> {
    #[cfg(feature = "excel")]
    {
        use super::excel;

        match sel {
            ExcelSheetSelection::First => excel::ingest_excel_from_path(path, None),
            ExcelSheetSelection::Sheet(name) => excel::ingest_excel_from_path(path, Some(name.as_str())),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (path, sel);
        Err(LoadError::UnsupportedFormat {
            message: "excel loading not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
