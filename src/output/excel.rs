#![cfg(feature = "excel")]

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{WriteError, WriteResult};
use crate::types::{DataSet, Value};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;
/// Largest magnitude an xlsx number (an f64) holds exactly.
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// Render `table` as an `.xlsx` workbook with a single sheet.
///
/// Row 0 holds the field names in bold; missing values are left as empty cells. Integers too
/// large for an exact f64 are written as text.
pub fn write_xlsx(table: &DataSet) -> WriteResult<Vec<u8>> {
    if table.row_count() + 1 > MAX_ROWS || table.schema.len() > MAX_COLUMNS {
        return Err(WriteError::UnsupportedFormat {
            message: format!(
                "{} rows x {} columns exceeds the xlsx sheet limits",
                table.row_count(),
                table.schema.len()
            ),
        });
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("books")?;

    for (col, name) in table.schema.field_names().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let xl_row = (r + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                Value::Null => {}
                Value::Int64(v) if v.unsigned_abs() > MAX_EXACT_INTEGER as u64 => {
                    sheet.write_string(xl_row, col, v.to_string())?;
                }
                Value::Int64(v) => {
                    sheet.write_number(xl_row, col, *v as f64)?;
                }
                Value::Float64(v) => {
                    sheet.write_number(xl_row, col, *v)?;
                }
                Value::Bool(v) => {
                    sheet.write_boolean(xl_row, col, *v)?;
                }
                Value::Utf8(s) => {
                    sheet.write_string(xl_row, col, s)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
