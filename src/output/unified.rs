//! Unified write entrypoint.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::error::{WriteError, WriteResult};
use crate::types::DataSet;

use super::{csv, json};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// Pretty-printed JSON array of objects.
    Json,
    /// Excel workbook (feature-gated behind `excel`).
    Xlsx,
}

impl OutputFormat {
    /// Parse an output format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Format inferred from the extension of `path`.
    pub fn from_path(path: &Path) -> WriteResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| WriteError::UnsupportedFormat {
                message: format!(
                    "cannot infer format: path has no extension ({})",
                    path.display()
                ),
            })?;

        Self::from_extension(ext).ok_or_else(|| WriteError::UnsupportedFormat {
            message: format!("cannot write '{ext}' files ({})", path.display()),
        })
    }
}

/// Options controlling [`write_to_path`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<OutputFormat>,
}

/// Write `table` to `path`, replacing any existing file atomically.
///
/// The content goes to a temporary file in the destination directory which is then renamed over
/// `path`; on any error the previous file (if any) is left untouched. Missing parent directories
/// are created.
pub fn write_to_path(table: &DataSet, path: impl AsRef<Path>, options: &WriteOptions) -> WriteResult<()> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => OutputFormat::from_path(path)?,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        match fmt {
            OutputFormat::Csv => csv::write_csv(table, &mut out)?,
            OutputFormat::Json => json::write_json(table, &mut out)?,
            OutputFormat::Xlsx => out.write_all(&xlsx_bytes(table)?)?,
        }
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| WriteError::Io(e.error))?;
    Ok(())
}

fn xlsx_bytes(table: &DataSet) -> WriteResult<Vec<u8>> {
    #[cfg(feature = "excel")]
    {
        super::excel::write_xlsx(table)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = table;
        Err(WriteError::UnsupportedFormat {
            message: "xlsx output not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_inference() {
        assert_eq!(OutputFormat::from_extension("CSV"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_extension("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_extension("xlsx"), Some(OutputFormat::Xlsx));
        assert_eq!(OutputFormat::from_extension("xls"), None);
        assert!(matches!(
            OutputFormat::from_path(Path::new("out/books.xls")),
            Err(WriteError::UnsupportedFormat { .. })
        ));
    }
}
