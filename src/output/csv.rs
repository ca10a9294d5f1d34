//! CSV writing.

use std::io::Write;

use crate::error::WriteResult;
use crate::types::DataSet;

use super::cell_text;

/// Write `table` as CSV: one header row with the field names, then one row per record.
///
/// Missing values are written as empty cells.
pub fn write_csv<W: Write>(table: &DataSet, writer: W) -> WriteResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.schema.field_names())?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(cell_text))?;
    }
    wtr.flush()?;
    Ok(())
}
