//! Record validation: required fields and ISBN format checks.

use std::fmt;

use crate::canonical::CanonicalSchema;
use crate::isbn::{self, IsbnForm};
use crate::types::{DataSet, Value};

/// What makes a normalized record valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Fields that must be non-missing.
    pub required_fields: Vec<String>,
    /// Also check the ISBN-10/ISBN-13 check digit (shape is always checked).
    pub verify_isbn_checksum: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            required_fields: Vec::new(),
            verify_isbn_checksum: true,
        }
    }
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// A required field is missing.
    MissingRequired { field: String },
    /// An ISBN field is neither 13 digits nor 9 digits followed by a digit or `X`.
    MalformedIsbn { field: String, value: String },
    /// An ISBN field has the right shape but a wrong check digit.
    BadIsbnCheckDigit { field: String, value: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingRequired { field } => {
                write!(f, "missing required field '{field}'")
            }
            RejectionReason::MalformedIsbn { field, value } => {
                write!(f, "'{field}' is not a well-formed isbn ({value})")
            }
            RejectionReason::BadIsbnCheckDigit { field, value } => {
                write!(f, "'{field}' has a wrong isbn check digit ({value})")
            }
        }
    }
}

/// A record excluded from the merge, with every check it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Row index in the normalized dataset.
    pub record: usize,
    /// Failed checks, in field order. Never empty.
    pub reasons: Vec<RejectionReason>,
    /// The rejected (normalized) row.
    pub row: Vec<Value>,
}

impl Rejection {
    /// Reasons joined with `"; "`.
    pub fn reasons_text(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Output of [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Records that passed every check, in input order.
    pub valid: DataSet,
    /// Records that failed at least one check, in input order.
    pub rejected: Vec<Rejection>,
}

/// Partition a normalized dataset into valid and rejected records.
///
/// A required field the dataset does not have counts as missing for every record. ISBN checks
/// apply to the non-missing values of every ISBN-coerced field of `canonical`.
pub fn validate(dataset: &DataSet, canonical: &CanonicalSchema, rules: &ValidationRules) -> Validation {
    let required: Vec<(&str, Option<usize>)> = rules
        .required_fields
        .iter()
        .map(|name| (name.as_str(), dataset.schema.index_of(name)))
        .collect();
    let isbn_fields: Vec<(&str, usize)> = canonical
        .fields
        .iter()
        .filter(|f| f.is_isbn())
        .filter_map(|f| Some((f.name.as_str(), dataset.schema.index_of(&f.name)?)))
        .collect();

    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    for (record, row) in dataset.rows.iter().enumerate() {
        let mut reasons = Vec::new();
        for (name, idx) in &required {
            let present = idx
                .and_then(|i| row.get(i))
                .is_some_and(|v| !v.is_missing());
            if !present {
                reasons.push(RejectionReason::MissingRequired {
                    field: (*name).to_string(),
                });
            }
        }
        for (name, idx) in &isbn_fields {
            if let Some(reason) = row.get(*idx).and_then(|v| check_isbn(name, v, rules)) {
                reasons.push(reason);
            }
        }

        if reasons.is_empty() {
            valid.push(row.clone());
        } else {
            rejected.push(Rejection {
                record,
                reasons,
                row: row.clone(),
            });
        }
    }

    Validation {
        valid: DataSet::new(dataset.schema.clone(), valid),
        rejected,
    }
}

fn check_isbn(field: &str, value: &Value, rules: &ValidationRules) -> Option<RejectionReason> {
    if value.is_missing() {
        return None;
    }
    let text = value.to_string();
    if IsbnForm::classify(&text).is_none() {
        return Some(RejectionReason::MalformedIsbn {
            field: field.to_string(),
            value: text,
        });
    }
    if rules.verify_isbn_checksum && !isbn::has_valid_check_digit(&text) {
        return Some(RejectionReason::BadIsbnCheckDigit {
            field: field.to_string(),
            value: text,
        });
    }
    None
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
        ])
    }

    fn row(isbn: Option<&str>, title: Option<&str>, author: Option<&str>) -> Vec<Value> {
        [isbn, title, author]
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Utf8(s.to_string())))
            .collect()
    }

    fn rules(required: &[&str]) -> ValidationRules {
        ValidationRules {
            required_fields: required.iter().map(|s| s.to_string()).collect(),
            verify_isbn_checksum: true,
        }
    }

    #[test]
    fn partitions_and_keeps_order() {
        let ds = DataSet::new(
            canonical().schema(),
            vec![
                row(Some("9780134685991"), Some("Clean Code"), None),
                row(None, None, Some("Anon")),
                row(Some("007462542X"), Some("Emma"), Some("Jane Austen")),
            ],
        );
        let out = validate(&ds, &canonical(), &rules(&["title"]));

        assert_eq!(out.valid.row_count(), 2);
        assert_eq!(out.valid.value(1, "title"), Some(&Value::Utf8("Emma".to_string())));
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].record, 1);
        assert_eq!(
            out.rejected[0].reasons,
            vec![RejectionReason::MissingRequired {
                field: "title".to_string()
            }]
        );
    }

    #[test]
    fn every_failed_check_is_listed() {
        let ds = DataSet::new(canonical().schema(), vec![row(Some("12345"), None, None)]);
        let out = validate(&ds, &canonical(), &rules(&["title", "author"]));

        assert!(out.valid.rows.is_empty());
        let reasons = &out.rejected[0].reasons;
        assert_eq!(reasons.len(), 3);
        assert!(matches!(reasons[2], RejectionReason::MalformedIsbn { .. }));
        assert_eq!(
            out.rejected[0].reasons_text(),
            "missing required field 'title'; missing required field 'author'; \
             'isbn' is not a well-formed isbn (12345)"
        );
    }

    #[test]
    fn checksum_is_optional() {
        let ds = DataSet::new(
            canonical().schema(),
            vec![row(Some("9780306406158"), Some("Bad Check"), None)],
        );
        let strict = validate(&ds, &canonical(), &rules(&[]));
        assert!(matches!(
            strict.rejected[0].reasons[0],
            RejectionReason::BadIsbnCheckDigit { .. }
        ));

        let lenient = ValidationRules {
            verify_isbn_checksum: false,
            ..rules(&[])
        };
        assert_eq!(validate(&ds, &canonical(), &lenient).valid.row_count(), 1);
    }

    #[test]
    fn missing_isbn_is_not_a_format_error() {
        let ds = DataSet::new(canonical().schema(), vec![row(None, Some("Untitled"), None)]);
        let out = validate(&ds, &canonical(), &rules(&["title"]));
        assert!(out.rejected.is_empty());
    }
}
