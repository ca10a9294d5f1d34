//! Projection of a loaded dataset onto the canonical schema.

use crate::canonical::CanonicalSchema;
use crate::types::{DataSet, Schema, Value};

/// Source column -> canonical field mapping for one dataset.
///
/// An empty map is the identity mapping: a source column is mapped to the canonical field whose
/// name matches it case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    /// Build a map from `(source column, canonical field)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The identity mapping.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.entries.is_empty()
    }

    /// For every source column (in order), the canonical field index it feeds, if any.
    ///
    /// Source names match exactly first, then case-insensitively. Entries naming a column the
    /// dataset lacks, or a field the canonical schema lacks, are ignored.
    pub fn resolve(&self, source: &Schema, canonical: &CanonicalSchema) -> Vec<Option<usize>> {
        source
            .fields
            .iter()
            .map(|field| {
                if self.is_identity() {
                    return canonical.index_of_loose(&field.name);
                }
                let name = field.name.trim();
                let target = self
                    .entries
                    .iter()
                    .find(|(src, _)| src == name)
                    .or_else(|| {
                        self.entries
                            .iter()
                            .find(|(src, _)| src.trim().eq_ignore_ascii_case(name))
                    })
                    .map(|(_, target)| target.as_str())?;
                canonical
                    .index_of(target)
                    .or_else(|| canonical.index_of_loose(target))
            })
            .collect()
    }
}

/// A source value that could not be coerced and was replaced by the missing marker.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedField {
    /// Row index in the source dataset.
    pub record: usize,
    /// Canonical field name.
    pub field: String,
    /// The offending source value.
    pub raw: Value,
    /// Why coercion failed.
    pub reason: String,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Dataset with exactly the canonical fields, in canonical order.
    pub data: DataSet,
    /// Every value that was degraded to missing.
    pub degraded: Vec<DegradedField>,
}

/// Map `dataset` onto `canonical`.
///
/// Rules:
///
/// - Unmapped source columns are dropped; canonical fields with no source column are `Null`.
/// - When several source columns feed one field, the first one (in source column order) whose
///   value coerces to something non-missing wins.
/// - A value that fails coercion becomes `Null` and is reported in [`Normalized::degraded`];
///   the record is kept.
/// - Fill values are not applied here. A field missing after coercion stays `Null` so the merge
///   can still take a real value from another dataset; see [`crate::processing::merge`].
///
/// Normalizing an already-normalized dataset with [`ColumnMap::identity`] returns it unchanged.
pub fn normalize(dataset: &DataSet, columns: &ColumnMap, canonical: &CanonicalSchema) -> Normalized {
    let targets = columns.resolve(&dataset.schema, canonical);
    let sources_by_field: Vec<Vec<usize>> = (0..canonical.len())
        .map(|c| {
            targets
                .iter()
                .enumerate()
                .filter(|(_, t)| **t == Some(c))
                .map(|(src, _)| src)
                .collect()
        })
        .collect();

    let mut degraded = Vec::new();
    let rows = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(record, row)| {
            canonical
                .fields
                .iter()
                .zip(&sources_by_field)
                .map(|(spec, sources)| {
                    let mut out = Value::Null;
                    for &src in sources {
                        let raw = match row.get(src) {
                            Some(v) if !v.is_missing() => v,
                            _ => continue,
                        };
                        match spec.coercion.apply(raw) {
                            Ok(Value::Null) => {}
                            Ok(v) => {
                                out = v;
                                break;
                            }
                            Err(reason) => degraded.push(DegradedField {
                                record,
                                field: spec.name.clone(),
                                raw: raw.clone(),
                                reason,
                            }),
                        }
                    }
                    out
                })
                .collect()
        })
        .collect();

    Normalized {
        data: DataSet::new(canonical.schema(), rows),
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CasePolicy, FieldSpec, FillValue};
    use crate::types::Field;

    fn canonical() -> CanonicalSchema {
        CanonicalSchema::new(vec![
            FieldSpec::isbn("isbn"),
            FieldSpec::text("title", CasePolicy::Title),
            FieldSpec::text("author", CasePolicy::Preserve),
            FieldSpec::integer("year"),
            FieldSpec::float("average_rating").with_fill(FillValue::Float(3.0)),
        ])
    }

    fn raw(headers: &[&str], rows: Vec<Vec<Value>>) -> DataSet {
        DataSet::new(
            Schema::new(headers.iter().map(|h| Field::raw(*h)).collect()),
            rows,
        )
    }

    fn utf8(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    #[test]
    fn identity_mapping_matches_names_case_insensitively() {
        let ds = raw(
            &["ISBN", "Title", "Shelf"],
            vec![vec![utf8("978-0-13-468599-1"), utf8("clean code"), utf8("A3")]],
        );
        let out = normalize(&ds, &ColumnMap::identity(), &canonical());

        assert_eq!(out.data.schema, canonical().schema());
        assert_eq!(
            out.data.rows[0],
            vec![
                utf8("9780134685991"),
                utf8("Clean Code"),
                Value::Null,
                Value::Null,
                Value::Null,
            ]
        );
        assert!(out.degraded.is_empty());
    }

    #[test]
    fn explicit_map_renames_and_first_present_source_wins() {
        let ds = raw(
            &["isbn", "isbn13", "authors", "original_publication_year"],
            vec![
                vec![Value::Null, Value::Int64(9780306406157), utf8("Ada"), utf8("2008.0")],
                vec![utf8("0306406152"), Value::Int64(9780306406157), Value::Null, Value::Null],
            ],
        );
        let map = ColumnMap::new([
            ("isbn".to_string(), "isbn".to_string()),
            ("isbn13".to_string(), "isbn".to_string()),
            ("authors".to_string(), "author".to_string()),
            ("original_publication_year".to_string(), "year".to_string()),
        ]);
        let out = normalize(&ds, &map, &canonical());

        assert_eq!(out.data.value(0, "isbn"), Some(&utf8("9780306406157")));
        assert_eq!(out.data.value(0, "author"), Some(&utf8("Ada")));
        assert_eq!(out.data.value(0, "year"), Some(&Value::Int64(2008)));
        assert_eq!(out.data.value(1, "isbn"), Some(&utf8("0306406152")));
        assert_eq!(out.data.value(1, "title"), Some(&Value::Null));
    }

    #[test]
    fn failed_coercion_degrades_to_missing_and_is_reported() {
        let ds = raw(
            &["title", "year", "average_rating"],
            vec![vec![utf8("dune"), utf8("circa 1965"), utf8("n/a")]],
        );
        let out = normalize(&ds, &ColumnMap::identity(), &canonical());

        assert_eq!(out.data.row_count(), 1);
        assert_eq!(out.data.value(0, "year"), Some(&Value::Null));
        // Fills wait for the merge; the field stays missing here.
        assert_eq!(out.data.value(0, "average_rating"), Some(&Value::Null));
        let fields: Vec<&str> = out.degraded.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["year", "average_rating"]);
        assert_eq!(out.degraded[0].record, 0);
        assert_eq!(out.degraded[0].raw, utf8("circa 1965"));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let ds = raw(
            &["Isbn", "TITLE", "author", "year"],
            vec![
                vec![utf8("ISBN 0-306-40615-2"), utf8("  the   HOBBIT "), utf8("Tolkien"), Value::Float64(1937.0)],
                vec![Value::Null, Value::Null, Value::Null, utf8("oops")],
            ],
        );
        let once = normalize(&ds, &ColumnMap::identity(), &canonical()).data;
        let twice = normalize(&once, &ColumnMap::identity(), &canonical());
        assert_eq!(twice.data, once);
        assert!(twice.degraded.is_empty());
    }

    #[test]
    fn map_entries_for_absent_columns_are_ignored() {
        let ds = raw(&["title"], vec![vec![utf8("emma")]]);
        let map = ColumnMap::new([
            ("title".to_string(), "title".to_string()),
            ("isbn_13".to_string(), "isbn".to_string()),
        ]);
        let out = normalize(&ds, &map, &canonical());
        assert_eq!(out.data.value(0, "title"), Some(&utf8("Emma")));
        assert_eq!(out.data.value(0, "isbn"), Some(&Value::Null));
    }
}
