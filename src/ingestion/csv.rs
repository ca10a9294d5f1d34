//! CSV loading.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::types::{DataSet, Field, Schema, Value};

/// Load a CSV file into an untyped in-memory [`DataSet`].
///
/// Rules:
///
/// - The first row is the header row; every header becomes a [`crate::types::DataType::Raw`]
///   column.
/// - Cells are kept as trimmed strings; empty cells become [`Value::Null`].
/// - Short rows are padded with `Null`; cells beyond the header width are ignored.
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> LoadResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> LoadResult<DataSet> {
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.is_empty() {
        return Err(LoadError::Malformed {
            message: "csv has no header row".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for h in &headers {
        if !h.is_empty() && !seen.insert(h.as_str()) {
            return Err(LoadError::Malformed {
                message: format!("duplicate column '{h}'. headers={headers:?}"),
            });
        }
    }

    let width = headers.len();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = (0..width)
            .map(|idx| raw_cell(record.get(idx).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    let schema = Schema::new(headers.into_iter().map(Field::raw).collect());
    Ok(DataSet::new(schema, rows))
}

fn raw_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::Utf8(trimmed.to_owned())
    }
}
