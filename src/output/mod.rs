//! Writers for the consolidated table.
//!
//! Most callers should use [`write_to_path`] (from [`unified`]), which picks the format from
//! [`WriteOptions`] or the file extension and replaces the target atomically.
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod unified;

pub use unified::{OutputFormat, WriteOptions, write_to_path};

use crate::types::Value;

/// Text form of a cell for text-based outputs. Integral floats keep a `.0` so a float column
/// reads back as floats.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Float64(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.1}"),
        other => other.to_string(),
    }
}
