//! In-memory record processing: normalize, validate, merge.
//!
//! Every stage is a pure function over [`crate::types::DataSet`] values. Events worth logging
//! (degraded fields, rejections, conflicts) are returned as data so the caller decides how to
//! report them.
//!
//! ## Example: normalize → validate → merge
//!
//! ```rust
//! use book_data_merge::canonical::{CanonicalSchema, CasePolicy, FieldSpec};
//! use book_data_merge::processing::{
//!     merge, normalize, validate, ColumnMap, MergeInput, MergeOptions, ValidationRules,
//! };
//! use book_data_merge::types::{DataSet, Field, Schema, Value};
//!
//! let canonical = CanonicalSchema::new(vec![
//!     FieldSpec::isbn("isbn"),
//!     FieldSpec::text("title", CasePolicy::Title),
//!     FieldSpec::text("author", CasePolicy::Preserve),
//! ]);
//! let a = DataSet::new(
//!     Schema::new(vec![Field::raw("ISBN"), Field::raw("Title")]),
//!     vec![vec![
//!         Value::Utf8("978-0-13-468599-1".to_string()),
//!         Value::Utf8("clean code".to_string()),
//!     ]],
//! );
//! let b = DataSet::new(
//!     Schema::new(vec![Field::raw("ISBN"), Field::raw("Title"), Field::raw("Author")]),
//!     vec![vec![
//!         Value::Utf8("9780134685991".to_string()),
//!         Value::Utf8("Clean Code".to_string()),
//!         Value::Utf8("Robert Martin".to_string()),
//!     ]],
//! );
//!
//! let rules = ValidationRules::default();
//! let a = validate(&normalize(&a, &ColumnMap::identity(), &canonical).data, &canonical, &rules).valid;
//! let b = validate(&normalize(&b, &ColumnMap::identity(), &canonical).data, &canonical, &rules).valid;
//!
//! let merged = merge(
//!     &[MergeInput { source: "a", data: &a }, MergeInput { source: "b", data: &b }],
//!     &canonical,
//!     &MergeOptions::default(),
//! );
//! assert_eq!(merged.table.row_count(), 1);
//! assert_eq!(merged.table.value(0, "author"), Some(&Value::Utf8("Robert Martin".to_string())));
//! ```

pub mod merge;
pub mod normalize;
pub mod validate;

pub use merge::{MergeConflict, MergeInput, MergeKey, MergeOptions, MergeReport, Merged, merge, merge_key_for_row};
pub use normalize::{ColumnMap, DegradedField, Normalized, normalize};
pub use validate::{Rejection, RejectionReason, Validation, ValidationRules, validate};
