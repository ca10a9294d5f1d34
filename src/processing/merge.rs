//! Deduplication and field-wise merge across datasets.
//!
//! Records are grouped by [`MergeKey`]. Each group becomes one output record whose fields are
//! resolved by dataset priority: the highest-ranked member with a non-missing value supplies the
//! field. Disagreeing lower-ranked values are reported as [`MergeConflict`]s. A field no member
//! has takes the canonical field's fill value, if one is configured.

use std::collections::HashMap;
use std::fmt;

use crate::canonical::CanonicalSchema;
use crate::isbn;
use crate::types::{DataSet, Value};

/// Merge-key strategies and dataset priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Key strategies tried in order. A strategy yields a key only if all its fields are present.
    pub strategies: Vec<Vec<String>>,
    /// Source names from highest to lowest priority. Unlisted sources follow in load order.
    pub priority: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            strategies: vec![
                vec!["isbn".to_string()],
                vec!["title".to_string(), "author".to_string()],
            ],
            priority: Vec::new(),
        }
    }
}

/// Identity of a record for deduplication.
///
/// Keys produced by different strategies never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    /// Index of the strategy that produced the key.
    pub strategy: usize,
    /// Comparison form of each key field: ISBNs as ISBN-13 where possible, text lower-cased.
    pub parts: Vec<String>,
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.strategy, self.parts.join(" | "))
    }
}

/// One valid, normalized dataset to merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    /// Configured source name.
    pub source: &'a str,
    /// Rows in canonical schema.
    pub data: &'a DataSet,
}

/// A field where a lower-priority record disagreed with the value that was kept.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConflict {
    pub key: MergeKey,
    pub field: String,
    pub kept: Value,
    pub kept_from: String,
    pub discarded: Value,
    pub discarded_from: String,
}

/// Counts and conflicts of one merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Records across all inputs.
    pub input_records: usize,
    /// Output records (one per group).
    pub groups: usize,
    /// Records for which no strategy produced a key.
    pub keyless_records: usize,
    /// Informational conflicts, in group order.
    pub conflicts: Vec<MergeConflict>,
    /// Output fields set from a configured fill value because no record had them.
    pub filled: usize,
}

impl MergeReport {
    /// Records folded into another record of their group.
    pub fn duplicates_merged(&self) -> usize {
        self.input_records.saturating_sub(self.groups)
    }
}

/// Output of [`merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// The consolidated table (canonical schema, first-seen group order).
    pub table: DataSet,
    pub report: MergeReport,
}

struct Member {
    rank: (usize, usize, usize),
    source: usize,
    values: Vec<Value>,
}

struct Group {
    key: Option<MergeKey>,
    members: Vec<Member>,
}

/// Merge valid normalized datasets (given in load order) into one table.
///
/// Input columns are matched to `canonical` by name; a canonical field an input lacks is
/// missing for all of its records. Fill values apply only to output fields that no group member
/// has, so a missing value never outranks a real one.
pub fn merge(inputs: &[MergeInput<'_>], canonical: &CanonicalSchema, options: &MergeOptions) -> Merged {
    let strategies = resolve_strategies(canonical, &options.strategies);
    let fills: Vec<Option<Value>> = canonical.fields.iter().map(|f| f.coerced_fill()).collect();

    let mut groups: Vec<Group> = Vec::new();
    let mut by_key: HashMap<MergeKey, usize> = HashMap::new();
    let mut report = MergeReport::default();

    for (load_idx, input) in inputs.iter().enumerate() {
        let priority = options
            .priority
            .iter()
            .position(|name| name == input.source)
            .unwrap_or(options.priority.len() + load_idx);
        let columns: Vec<Option<usize>> = canonical
            .fields
            .iter()
            .map(|f| input.data.schema.index_of(&f.name))
            .collect();

        for (row_idx, row) in input.data.rows.iter().enumerate() {
            report.input_records += 1;
            let values: Vec<Value> = columns
                .iter()
                .map(|c| c.and_then(|i| row.get(i)).cloned().unwrap_or(Value::Null))
                .collect();
            let member = Member {
                rank: (priority, load_idx, row_idx),
                source: load_idx,
                values,
            };

            match merge_key(canonical, &strategies, &member.values) {
                Some(key) => match by_key.get(&key) {
                    Some(&g) => groups[g].members.push(member),
                    None => {
                        by_key.insert(key.clone(), groups.len());
                        groups.push(Group {
                            key: Some(key),
                            members: vec![member],
                        });
                    }
                },
                None => {
                    report.keyless_records += 1;
                    groups.push(Group {
                        key: None,
                        members: vec![member],
                    });
                }
            }
        }
    }

    let rows = groups
        .into_iter()
        .map(|group| resolve_group(group, canonical, &fills, inputs, &mut report))
        .collect::<Vec<_>>();
    report.groups = rows.len();

    Merged {
        table: DataSet::new(canonical.schema(), rows),
        report,
    }
}

/// Compute the merge key of a canonical row, if any strategy applies.
pub fn merge_key_for_row(canonical: &CanonicalSchema, options: &MergeOptions, row: &[Value]) -> Option<MergeKey> {
    merge_key(canonical, &resolve_strategies(canonical, &options.strategies), row)
}

/// Strategies as canonical field indices. A strategy naming an unknown field never applies.
fn resolve_strategies(canonical: &CanonicalSchema, strategies: &[Vec<String>]) -> Vec<Option<Vec<usize>>> {
    strategies
        .iter()
        .map(|fields| {
            if fields.is_empty() {
                return None;
            }
            fields.iter().map(|f| canonical.index_of(f)).collect()
        })
        .collect()
}

fn merge_key(canonical: &CanonicalSchema, strategies: &[Option<Vec<usize>>], row: &[Value]) -> Option<MergeKey> {
    strategies.iter().enumerate().find_map(|(strategy, fields)| {
        let parts = fields
            .as_ref()?
            .iter()
            .map(|&idx| {
                let value = row.get(idx).filter(|v| !v.is_missing())?;
                let text = value.to_string();
                if canonical.fields[idx].is_isbn() {
                    Some(isbn::comparison_form(&text))
                } else {
                    Some(text.to_lowercase())
                }
            })
            .collect::<Option<Vec<_>>>()?;
        Some(MergeKey { strategy, parts })
    })
}

fn resolve_group(
    mut group: Group,
    canonical: &CanonicalSchema,
    fills: &[Option<Value>],
    inputs: &[MergeInput<'_>],
    report: &mut MergeReport,
) -> Vec<Value> {
    group.members.sort_by_key(|m| m.rank);
    let source_name = |m: &Member| inputs[m.source].source.to_string();

    canonical
        .fields
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let mut present = group.members.iter().filter(|m| !m.values[idx].is_missing());
            let Some(winner) = present.next() else {
                return match &fills[idx] {
                    Some(fill) => {
                        report.filled += 1;
                        fill.clone()
                    }
                    None => Value::Null,
                };
            };
            let kept = winner.values[idx].clone();
            if let Some(key) = &group.key {
                for other in present.filter(|m| m.values[idx] != kept) {
                    report.conflicts.push(MergeConflict {
                        key: key.clone(),
                        field: spec.name.clone(),
                        kept: kept.clone(),
                        kept_from: source_name(winner),
                        discarded: other.values[idx].clone(),
                        discarded_from: source_name(other),
                    });
                }
            }
            kept
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CasePolicy, FieldSpec};

    fn canonical() -> CanonicalSchema {
        CanonicalSchema::new(vec![
            FieldSpec::isbn("isbn"),
            FieldSpec::text("title", CasePolicy::Title),
            FieldSpec::text("author", CasePolicy::Preserve),
            FieldSpec::integer("year"),
        ])
    }

    fn ds(rows: Vec<[Value; 4]>) -> DataSet {
        DataSet::new(canonical().schema(), rows.into_iter().map(Vec::from).collect())
    }

    fn s(v: &str) -> Value {
        Value::Utf8(v.to_string())
    }

    const N: Value = Value::Null;

    #[test]
    fn equal_keys_union_disjoint_fields() {
        let a = ds(vec![[s("9780134685991"), s("Clean Code"), N, N]]);
        let b = ds(vec![[s("9780134685991"), N, s("Robert Martin"), Value::Int64(2008)]]);
        let out = merge(
            &[
                MergeInput { source: "a", data: &a },
                MergeInput { source: "b", data: &b },
            ],
            &canonical(),
            &MergeOptions::default(),
        );

        assert_eq!(out.table.row_count(), 1);
        assert_eq!(
            out.table.rows[0],
            vec![s("9780134685991"), s("Clean Code"), s("Robert Martin"), Value::Int64(2008)]
        );
        assert_eq!(out.report.input_records, 2);
        assert_eq!(out.report.groups, 1);
        assert_eq!(out.report.duplicates_merged(), 1);
        assert!(out.report.conflicts.is_empty());
    }

    #[test]
    fn priority_decides_conflicts_and_they_are_reported() {
        let a = ds(vec![[s("9780134685991"), s("Clean Code"), N, Value::Int64(2009)]]);
        let b = ds(vec![[s("9780134685991"), s("Clean Code 2nd"), N, Value::Int64(2008)]]);
        let inputs = [
            MergeInput { source: "a", data: &a },
            MergeInput { source: "b", data: &b },
        ];

        let load_order = merge(&inputs, &canonical(), &MergeOptions::default());
        assert_eq!(load_order.table.value(0, "year"), Some(&Value::Int64(2009)));

        let options = MergeOptions {
            priority: vec!["b".to_string()],
            ..MergeOptions::default()
        };
        let out = merge(&inputs, &canonical(), &options);
        assert_eq!(out.table.value(0, "title"), Some(&s("Clean Code 2nd")));
        assert_eq!(out.table.value(0, "year"), Some(&Value::Int64(2008)));

        let fields: Vec<&str> = out.report.conflicts.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "year"]);
        assert_eq!(out.report.conflicts[1].kept_from, "b");
        assert_eq!(out.report.conflicts[1].discarded_from, "a");
        assert_eq!(out.report.conflicts[1].discarded, Value::Int64(2009));
    }

    #[test]
    fn fill_applies_only_when_no_member_has_the_field() {
        use crate::canonical::FillValue;

        let canonical = CanonicalSchema::new(vec![
            FieldSpec::isbn("isbn"),
            FieldSpec::text("title", CasePolicy::Title),
            FieldSpec::float("average_rating").with_fill(FillValue::Float(3.0)),
        ]);
        let rows = |rows: Vec<[Value; 3]>| {
            DataSet::new(canonical.schema(), rows.into_iter().map(Vec::from).collect())
        };
        let preferred = rows(vec![
            [s("9780134685991"), s("Clean Code"), N],
            [s("9780306406157"), s("Signals"), N],
        ]);
        let rated = rows(vec![[s("9780134685991"), s("Clean Code"), Value::Float64(4.5)]]);
        let options = MergeOptions {
            priority: vec!["preferred".to_string()],
            ..MergeOptions::default()
        };

        let out = merge(
            &[
                MergeInput { source: "rated", data: &rated },
                MergeInput { source: "preferred", data: &preferred },
            ],
            &canonical,
            &options,
        );

        assert_eq!(out.table.value(0, "average_rating"), Some(&Value::Float64(4.5)));
        assert_eq!(out.table.value(1, "average_rating"), Some(&Value::Float64(3.0)));
        assert_eq!(out.report.filled, 1);
        assert!(out.report.conflicts.is_empty());
    }

    #[test]
    fn different_keys_never_merge() {
        let a = ds(vec![
            [s("9780134685991"), s("Clean Code"), s("Robert Martin"), N],
            [s("9780306406157"), s("Clean Code"), s("Robert Martin"), N],
        ]);
        let out = merge(
            &[MergeInput { source: "a", data: &a }],
            &canonical(),
            &MergeOptions::default(),
        );
        assert_eq!(out.table.row_count(), 2);
    }

    #[test]
    fn fallback_key_is_case_insensitive_and_separate_from_isbn_keys() {
        let a = ds(vec![
            [N, s("Dune"), s("Frank Herbert"), N],
            [N, s("DUNE"), s("frank herbert"), Value::Int64(1965)],
            // Has an isbn, so it is keyed by isbn and must not join the title/author group.
            [s("9780441013593"), s("Dune"), s("Frank Herbert"), N],
        ]);
        let out = merge(
            &[MergeInput { source: "a", data: &a }],
            &canonical(),
            &MergeOptions::default(),
        );
        assert_eq!(out.table.row_count(), 2);
        assert_eq!(out.table.rows[0], vec![N, s("Dune"), s("Frank Herbert"), Value::Int64(1965)]);
        assert_eq!(out.report.conflicts.len(), 2);
    }

    #[test]
    fn isbn10_and_isbn13_of_one_book_share_a_key() {
        let a = ds(vec![[s("0306406152"), s("Signals"), N, N]]);
        let b = ds(vec![[s("9780306406157"), N, s("Someone"), N]]);
        let out = merge(
            &[
                MergeInput { source: "a", data: &a },
                MergeInput { source: "b", data: &b },
            ],
            &canonical(),
            &MergeOptions::default(),
        );
        assert_eq!(out.table.row_count(), 1);
        assert_eq!(out.table.value(0, "author"), Some(&s("Someone")));
    }

    #[test]
    fn keyless_records_stay_in_first_seen_position() {
        let a = ds(vec![
            [s("9780134685991"), s("Clean Code"), N, N],
            [N, s("Anonymous Pamphlet"), N, N],
            [N, s("Anonymous Pamphlet"), N, N],
        ]);
        let b = ds(vec![[s("9780134685991"), N, s("Robert Martin"), N]]);
        let out = merge(
            &[
                MergeInput { source: "a", data: &a },
                MergeInput { source: "b", data: &b },
            ],
            &canonical(),
            &MergeOptions::default(),
        );
        assert_eq!(out.table.row_count(), 3);
        assert_eq!(out.report.keyless_records, 2);
        assert_eq!(out.table.value(0, "author"), Some(&s("Robert Martin")));
        assert_eq!(out.table.value(2, "title"), Some(&s("Anonymous Pamphlet")));
    }

    #[test]
    fn merge_key_prefers_earlier_strategies() {
        let options = MergeOptions::default();
        let key = merge_key_for_row(&canonical(), &options, &[s("0306406152"), s("T"), s("A"), N]);
        assert_eq!(
            key,
            Some(MergeKey {
                strategy: 0,
                parts: vec!["9780306406157".to_string()]
            })
        );
        let key = merge_key_for_row(&canonical(), &options, &[N, s("Emma"), s("Jane Austen"), N]);
        assert_eq!(key.map(|k| k.to_string()).as_deref(), Some("[1] emma | jane austen"));
        assert_eq!(merge_key_for_row(&canonical(), &options, &[N, s("Emma"), N, N]), None);
    }
}
