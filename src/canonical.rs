//! The canonical schema every record is normalized into.
//!
//! A [`CanonicalSchema`] is an ordered list of [`FieldSpec`]s. Each field carries the
//! [`Coercion`] rule that turns a raw source [`Value`] into the field's canonical type, and an
//! optional [`FillValue`] used when the field is missing after coercion.

use serde::Deserialize;

use crate::isbn;
use crate::types::{DataType, Field, Schema, Value};

/// Case policy for text fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicy {
    /// Keep the source casing.
    #[default]
    Preserve,
    /// Upper-case the first letter of every word and lower-case the rest.
    Title,
    /// Lower-case everything.
    Lower,
    /// Upper-case everything.
    Upper,
}

/// How a raw source value is coerced into a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Coercion {
    /// Trimmed text with collapsed whitespace and a case policy.
    Text {
        #[serde(default)]
        case: CasePolicy,
    },
    /// ISBN: label, hyphens and whitespace stripped. Optionally upgrades valid ISBN-10s.
    Isbn {
        #[serde(default)]
        to_isbn13: bool,
    },
    /// 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
}

impl Coercion {
    /// The data type of values this rule produces.
    pub fn data_type(&self) -> DataType {
        match self {
            Coercion::Text { .. } | Coercion::Isbn { .. } => DataType::Utf8,
            Coercion::Integer => DataType::Int64,
            Coercion::Float => DataType::Float64,
        }
    }

    /// Coerce `value` into this rule's canonical form.
    ///
    /// Missing input (and text that is empty after trimming) yields `Ok(Value::Null)`. A present
    /// value that cannot be coerced yields `Err` with a short reason.
    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        if value.is_missing() {
            return Ok(Value::Null);
        }
        match self {
            Coercion::Text { case } => Ok(coerce_text(value, *case)),
            Coercion::Isbn { to_isbn13 } => coerce_isbn(value, *to_isbn13),
            Coercion::Integer => coerce_integer(value),
            Coercion::Float => coerce_float(value),
        }
    }
}

/// Default value for a field that is missing after coercion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FillValue {
    /// The fill as an (uncoerced) [`Value`].
    pub fn to_value(&self) -> Value {
        match self {
            FillValue::Integer(v) => Value::Int64(*v),
            FillValue::Float(v) => Value::Float64(*v),
            FillValue::Text(s) => Value::Utf8(s.clone()),
        }
    }
}

/// One field of the canonical schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: String,
    /// Coercion rule for values mapped into this field.
    pub coercion: Coercion,
    /// Value used when the field is missing after coercion.
    #[serde(default)]
    pub fill: Option<FillValue>,
}

impl FieldSpec {
    /// A text field with the given case policy.
    pub fn text(name: impl Into<String>, case: CasePolicy) -> Self {
        Self::new(name, Coercion::Text { case })
    }

    /// An ISBN field (no ISBN-10 upgrade).
    pub fn isbn(name: impl Into<String>) -> Self {
        Self::new(name, Coercion::Isbn { to_isbn13: false })
    }

    /// An integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, Coercion::Integer)
    }

    /// A float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, Coercion::Float)
    }

    /// A field with an explicit coercion rule and no fill.
    pub fn new(name: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            name: name.into(),
            coercion,
            fill: None,
        }
    }

    /// Set the fill value.
    #[must_use]
    pub fn with_fill(mut self, fill: FillValue) -> Self {
        self.fill = Some(fill);
        self
    }

    /// The fill value coerced through this field's rule, if a fill is configured and coerces.
    pub fn coerced_fill(&self) -> Option<Value> {
        let fill = self.fill.as_ref()?;
        match self.coercion.apply(&fill.to_value()) {
            Ok(Value::Null) | Err(_) => None,
            Ok(v) => Some(v),
        }
    }

    /// True if values of this field are ISBNs.
    pub fn is_isbn(&self) -> bool {
        matches!(self.coercion, Coercion::Isbn { .. })
    }
}

/// Ordered set of canonical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    pub fields: Vec<FieldSpec>,
}

impl CanonicalSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The typed [`Schema`] of normalized datasets.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.fields
                .iter()
                .map(|f| Field::new(f.name.clone(), f.coercion.data_type()))
                .collect(),
        )
    }

    /// Index of a canonical field by exact name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Index of a canonical field by trimmed, case-insensitive name.
    pub fn index_of_loose(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Trim, collapse internal whitespace, and apply `case`.
pub fn clean_text(raw: &str, case: CasePolicy) -> String {
    let words = raw.split_whitespace();
    match case {
        CasePolicy::Preserve => words.collect::<Vec<_>>().join(" "),
        CasePolicy::Lower => words.map(str::to_lowercase).collect::<Vec<_>>().join(" "),
        CasePolicy::Upper => words.map(str::to_uppercase).collect::<Vec<_>>().join(" "),
        CasePolicy::Title => words.map(title_case_word).collect::<Vec<_>>().join(" "),
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    // Multi-char upper-case expansions (e.g. 'ß' -> "SS") keep only their first char upper-cased.
    let mut upper = first.to_uppercase();
    let mut out = String::with_capacity(word.len());
    if let Some(head) = upper.next() {
        out.push(head);
    }
    out.extend(upper.flat_map(char::to_lowercase));
    out.extend(chars.flat_map(char::to_lowercase));
    out
}

fn coerce_text(value: &Value, case: CasePolicy) -> Value {
    let text = match value {
        Value::Utf8(s) => clean_text(s, case),
        other => clean_text(&other.to_string(), case),
    };
    if text.is_empty() {
        Value::Null
    } else {
        Value::Utf8(text)
    }
}

fn coerce_isbn(value: &Value, to_isbn13: bool) -> Result<Value, String> {
    let canonical = match value {
        Value::Int64(n) if *n >= 0 => pad_isbn_digits(n.to_string()),
        Value::Int64(n) => return Err(format!("numeric isbn is negative ({n})")),
        Value::Float64(f) => isbn_from_number(*f)?,
        Value::Utf8(s) => {
            let stripped = isbn::canonicalize(s);
            match parse_scientific(&stripped) {
                Some(f) => isbn_from_number(f)?,
                None => pad_isbn_digits(stripped),
            }
        }
        Value::Bool(_) => return Err("expected isbn, got bool".to_string()),
        Value::Null => return Ok(Value::Null),
    };
    if canonical.is_empty() {
        return Ok(Value::Null);
    }
    let canonical = if to_isbn13 {
        isbn::isbn10_to_isbn13(&canonical).unwrap_or(canonical)
    } else {
        canonical
    };
    Ok(Value::Utf8(canonical))
}

/// Numeric ISBNs lose leading zeros; nine digits are an ISBN-10 starting with `0`.
fn isbn_from_number(f: f64) -> Result<String, String> {
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 {
        return Err(format!("numeric isbn is not a non-negative integer ({f})"));
    }
    Ok(pad_isbn_digits(format!("{f:.0}")))
}

fn pad_isbn_digits(digits: String) -> String {
    if digits.len() == 9 && digits.bytes().all(|b| b.is_ascii_digit()) {
        format!("0{digits}")
    } else {
        digits
    }
}

/// Spreadsheet exports often turn ISBN-13s into strings like `9.780134685991e12`.
fn parse_scientific(s: &str) -> Option<f64> {
    if !s.contains(['e', 'E']) {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn coerce_integer(value: &Value) -> Result<Value, String> {
    match value {
        Value::Int64(n) => Ok(Value::Int64(*n)),
        Value::Float64(f) => integral_float(*f).map(Value::Int64),
        Value::Utf8(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::Int64(n));
            }
            let f = trimmed
                .parse::<f64>()
                .map_err(|_| format!("expected integer, got '{trimmed}'"))?;
            integral_float(f).map(Value::Int64)
        }
        Value::Bool(_) => Err("expected integer, got bool".to_string()),
        Value::Null => Ok(Value::Null),
    }
}

fn integral_float(f: f64) -> Result<i64, String> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(format!("expected integer, got {f}"))
    }
}

fn coerce_float(value: &Value) -> Result<Value, String> {
    let f = match value {
        Value::Int64(n) => *n as f64,
        Value::Float64(f) => *f,
        Value::Utf8(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| format!("expected number, got '{trimmed}'"))?
        }
        Value::Bool(_) => return Err("expected number, got bool".to_string()),
        Value::Null => return Ok(Value::Null),
    };
    if f.is_finite() {
        Ok(Value::Float64(f))
    } else {
        Err(format!("expected finite number, got {f}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    #[test]
    fn text_is_trimmed_collapsed_and_cased() {
        let title = Coercion::Text { case: CasePolicy::Title };
        assert_eq!(title.apply(&utf8("  clean   code ")), Ok(utf8("Clean Code")));
        assert_eq!(title.apply(&utf8("THE art OF war")), Ok(utf8("The Art Of War")));

        let lower = Coercion::Text { case: CasePolicy::Lower };
        assert_eq!(lower.apply(&utf8("Robert  MARTIN")), Ok(utf8("robert martin")));

        let preserve = Coercion::Text { case: CasePolicy::Preserve };
        assert_eq!(preserve.apply(&utf8("   ")), Ok(Value::Null));
        assert_eq!(preserve.apply(&Value::Int64(42)), Ok(utf8("42")));
    }

    #[test]
    fn title_case_handles_multi_char_uppercase() {
        let once = clean_text("ßtraße", CasePolicy::Title);
        assert_eq!(once, "Sstraße");
        assert_eq!(clean_text(&once, CasePolicy::Title), once);
    }

    #[test]
    fn isbn_from_strings_and_numbers() {
        let rule = Coercion::Isbn { to_isbn13: false };
        assert_eq!(rule.apply(&utf8("978-0-13-468599-1")), Ok(utf8("9780134685991")));
        assert_eq!(rule.apply(&Value::Int64(9780134685991)), Ok(utf8("9780134685991")));
        assert_eq!(rule.apply(&Value::Float64(9780134685991.0)), Ok(utf8("9780134685991")));
        assert_eq!(rule.apply(&utf8("9.780134685991e12")), Ok(utf8("9780134685991")));
        // Leading zero restored for nine-digit numbers.
        assert_eq!(rule.apply(&Value::Int64(306406152)), Ok(utf8("0306406152")));
        assert_eq!(rule.apply(&utf8("306406152")), Ok(utf8("0306406152")));
        assert_eq!(rule.apply(&utf8(" - ")), Ok(Value::Null));
        assert!(rule.apply(&Value::Float64(12.5)).is_err());
        assert!(rule.apply(&Value::Bool(true)).is_err());
    }

    #[test]
    fn isbn_upgrade_only_for_valid_isbn10() {
        let rule = Coercion::Isbn { to_isbn13: true };
        assert_eq!(rule.apply(&utf8("0-306-40615-2")), Ok(utf8("9780306406157")));
        assert_eq!(rule.apply(&utf8("0306406153")), Ok(utf8("0306406153")));
        assert_eq!(rule.apply(&utf8("9780306406157")), Ok(utf8("9780306406157")));
    }

    #[test]
    fn integer_and_float_coercion() {
        assert_eq!(Coercion::Integer.apply(&utf8(" 2008 ")), Ok(Value::Int64(2008)));
        assert_eq!(Coercion::Integer.apply(&utf8("2008.0")), Ok(Value::Int64(2008)));
        assert_eq!(Coercion::Integer.apply(&Value::Float64(1999.0)), Ok(Value::Int64(1999)));
        assert!(Coercion::Integer.apply(&utf8("circa 2008")).is_err());
        assert!(Coercion::Integer.apply(&Value::Float64(4.5)).is_err());

        assert_eq!(Coercion::Float.apply(&utf8("4.25")), Ok(Value::Float64(4.25)));
        assert_eq!(Coercion::Float.apply(&Value::Int64(4)), Ok(Value::Float64(4.0)));
        assert!(Coercion::Float.apply(&utf8("NaN")).is_err());
        assert!(Coercion::Float.apply(&utf8("n/a")).is_err());
    }

    #[test]
    fn fill_is_coerced_through_the_field_rule() {
        let rating = FieldSpec::float("average_rating").with_fill(FillValue::Integer(3));
        assert_eq!(rating.coerced_fill(), Some(Value::Float64(3.0)));

        let year = FieldSpec::integer("year").with_fill(FillValue::Text("unknown".to_string()));
        assert_eq!(year.coerced_fill(), None);
    }

    #[test]
    fn canonical_schema_types_and_lookup() {
        let canonical = CanonicalSchema::new(vec![
            FieldSpec::isbn("isbn"),
            FieldSpec::text("title", CasePolicy::Title),
            FieldSpec::integer("year"),
        ]);
        let schema = canonical.schema();
        assert_eq!(schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(schema.fields[2].data_type, DataType::Int64);
        assert_eq!(canonical.index_of_loose(" Title "), Some(1));
        assert_eq!(canonical.index_of("Title"), None);
    }
}
