//! JSON loading.
//!
//! The only supported shape is a top-level array of objects: `[{"a":1}, {"a":2}]`. Columns are
//! the union of object keys in first-seen order; a key absent from an object is `Null`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::types::{DataSet, Field, Schema, Value};

/// Load a JSON file into an untyped in-memory [`DataSet`].
pub fn ingest_json_from_path(path: impl AsRef<Path>) -> LoadResult<DataSet> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text)
}

/// Load JSON from an in-memory string into a [`DataSet`].
pub fn ingest_json_from_str(input: &str) -> LoadResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LoadError::Malformed {
            message: "json input is empty".to_string(),
        });
    }

    match serde_json::from_str::<serde_json::Value>(trimmed)? {
        serde_json::Value::Array(items) => ingest_json_values(&items),
        _ => Err(LoadError::Malformed {
            message: "json must be an array of objects".to_string(),
        }),
    }
}

fn ingest_json_values(values: &[serde_json::Value]) -> LoadResult<DataSet> {
    let mut columns: Vec<String> = Vec::new();
    let mut column_idx: HashMap<String, usize> = HashMap::new();
    let mut objects = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| LoadError::Malformed {
            message: format!("row {row_num} is not a json object"),
        })?;
        for key in obj.keys() {
            if !column_idx.contains_key(key) {
                column_idx.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            let mut row = vec![Value::Null; columns.len()];
            for (key, jv) in obj {
                if let Some(&idx) = column_idx.get(key) {
                    row[idx] = convert_json_value(jv);
                }
            }
            row
        })
        .collect();

    let schema = Schema::new(columns.into_iter().map(Field::raw).collect());
    Ok(DataSet::new(schema, rows))
}

fn convert_json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if n.is_u64() {
                // Out of i64 range: keep the digits rather than lose precision.
                Value::Utf8(n.to_string())
            } else {
                n.as_f64().map(Value::Float64).unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Utf8(trimmed.to_string())
            }
        }
        serde_json::Value::Array(items) => join_scalars(items),
        serde_json::Value::Object(_) => Value::Utf8(v.to_string()),
    }
}

/// `["Ada", "Grace"]` -> `"Ada, Grace"`; arrays holding objects/arrays are kept as JSON text.
fn join_scalars(items: &[serde_json::Value]) -> Value {
    if items.iter().any(|i| i.is_array() || i.is_object()) {
        return Value::Utf8(serde_json::Value::Array(items.to_vec()).to_string());
    }
    let parts: Vec<String> = items
        .iter()
        .map(convert_json_value)
        .filter(|v| !v.is_missing())
        .map(|v| v.to_string())
        .collect();
    if parts.is_empty() {
        Value::Null
    } else {
        Value::Utf8(parts.join(", "))
    }
}
