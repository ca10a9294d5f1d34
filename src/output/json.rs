//! JSON writing.

use std::io::Write;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::WriteResult;
use crate::types::{DataSet, Schema, Value};

/// Write `table` as a pretty-printed JSON array of objects.
///
/// Object keys follow schema order; missing values are `null`.
pub fn write_json<W: Write>(table: &DataSet, mut writer: W) -> WriteResult<()> {
    serde_json::to_writer_pretty(&mut writer, &Records(table))?;
    writer.write_all(b"\n")?;
    Ok(())
}

struct Records<'a>(&'a DataSet);

struct Record<'a> {
    schema: &'a Schema,
    row: &'a [Value],
}

struct Cell<'a>(&'a Value);

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
        for row in &self.0.rows {
            seq.serialize_element(&Record {
                schema: &self.0.schema,
                row,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schema.len()))?;
        for (idx, name) in self.schema.field_names().enumerate() {
            map.serialize_entry(name, &Cell(self.row.get(idx).unwrap_or(&Value::Null)))?;
        }
        map.end()
    }
}

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_none(),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Utf8(s) => serializer.serialize_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field};

    #[test]
    fn keys_follow_schema_order_and_nulls_are_kept() {
        let table = DataSet::new(
            Schema::new(vec![
                Field::new("title", DataType::Utf8),
                Field::new("author", DataType::Utf8),
                Field::new("year", DataType::Int64),
            ]),
            vec![vec![Value::Utf8("Emma".to_string()), Value::Null, Value::Int64(1815)]],
        );
        let mut buf = Vec::new();
        write_json(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let title = text.find("\"title\"").unwrap();
        let author = text.find("\"author\"").unwrap();
        let year = text.find("\"year\"").unwrap();
        assert!(title < author && author < year);

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{"title": "Emma", "author": null, "year": 1815}])
        );
    }
}
