#![cfg(feature = "excel")]

use std::collections::HashSet;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::{LoadError, LoadResult};
use crate::types::{DataSet, Field, Schema, Value};

/// Load one sheet of an Excel document (`.xlsx`, `.xls`, `.ods`, etc.) into a [`DataSet`].
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row
/// - Reads remaining rows, skipping rows whose cells are all empty
/// - Numbers, booleans and strings keep their cell type; empty and error cells become `Null`
pub fn ingest_excel_from_path(path: impl AsRef<Path>, sheet_name: Option<&str>) -> LoadResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Malformed {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    ingest_sheet_range(&range).map_err(|e| wrap_err_with_sheet(&sheet, e))
}

fn ingest_sheet_range(range: &calamine::Range<Data>) -> LoadResult<DataSet> {
    let (header_row_idx, headers) = find_header_row(range)?;

    let width = headers.len();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for row in range.rows().skip(header_row_idx + 1) {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let out_row = (0..width)
            .map(|idx| convert_cell(row.get(idx).unwrap_or(&Data::Empty)))
            .collect();
        rows.push(out_row);
    }

    let schema = Schema::new(headers.into_iter().map(Field::raw).collect());
    Ok(DataSet::new(schema, rows))
}

fn wrap_err_with_sheet(sheet: &str, err: LoadError) -> LoadError {
    match err {
        LoadError::Malformed { message } => LoadError::Malformed {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn find_header_row(range: &calamine::Range<Data>) -> LoadResult<(usize, Vec<String>)> {
    let (idx, row) = range
        .rows()
        .enumerate()
        .find(|(_, row)| row.iter().any(|c| !matches!(c, Data::Empty)))
        .ok_or_else(|| LoadError::Malformed {
            message: "sheet has no non-empty rows (no header row found)".to_string(),
        })?;

    let headers: Vec<String> = row
        .iter()
        .map(|c| cell_to_header_string(c).trim().to_string())
        .collect();
    let mut seen = HashSet::new();
    for h in &headers {
        if !h.is_empty() && !seen.insert(h.as_str()) {
            return Err(LoadError::Malformed {
                message: format!("duplicate column '{h}'. headers={headers:?}"),
            });
        }
    }
    Ok((idx, headers))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => "".to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Utf8(trimmed.to_string())
            }
        }
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(d) => Value::Utf8(d.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Utf8(s.clone()),
    }
}
