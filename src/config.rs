//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is everything a run needs: the canonical schema, the source datasets
//! with their column maps, required fields, merge-key strategies, dataset priority and the output
//! target. It is deserialized from TOML; the binary ships with [`EMBEDDED_CONFIG`] compiled in so
//! that it runs without arguments.
//!
//! ```toml
//! required_fields = ["title"]
//! priority = ["catalogue", "goodreads"]
//! merge_keys = [["isbn"], ["title", "author"]]
//!
//! [[schema]]
//! name = "isbn"
//! coercion = { type = "isbn", to_isbn13 = true }
//!
//! [[schema]]
//! name = "title"
//! coercion = { type = "text", case = "title" }
//!
//! [[sources]]
//! name = "goodreads"
//! path = "data/books.csv"
//! [sources.columns]
//! isbn13 = "isbn"
//! title = "title"
//!
//! [output]
//! path = "data/books_consolidated.csv"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::canonical::{CanonicalSchema, FieldSpec};
use crate::error::{ConfigError, ConfigResult};
use crate::ingestion::{ExcelSheetSelection, IngestionFormat};
use crate::output::OutputFormat;
use crate::processing::{ColumnMap, MergeOptions, ValidationRules};

/// The configuration compiled into the binary (`config/default.toml`).
pub const EMBEDDED_CONFIG: &str = include_str!("../config/default.toml");

/// Full configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Canonical schema, in output order.
    pub schema: Vec<FieldSpec>,
    /// Input datasets, in load order.
    pub sources: Vec<SourceConfig>,
    /// Fields that must be present for a record to be valid.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Source names from highest to lowest merge priority. Unlisted sources follow in load order.
    #[serde(default)]
    pub priority: Vec<String>,
    /// Merge-key strategies, tried in order; the first whose fields are all present wins.
    ///
    /// When omitted, `[["isbn"], ["title", "author"]]` is used, minus any strategy naming a field
    /// the schema lacks. See [`PipelineConfig::merge_strategies`].
    #[serde(default)]
    pub merge_keys: Option<Vec<Vec<String>>>,
    /// Format checks.
    #[serde(default)]
    pub validation: ValidationOptions,
    /// Output target.
    pub output: OutputConfig,
}

/// One input dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Unique name used in priority lists, logs and reports.
    pub name: String,
    /// Path of the input file.
    pub path: PathBuf,
    /// Input format; inferred from the extension when omitted.
    #[serde(default)]
    pub format: Option<IngestionFormat>,
    /// Source column -> canonical field. Empty means "match canonical names".
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    /// Worksheet to read from Excel workbooks (first sheet when omitted).
    #[serde(default)]
    pub sheet: Option<String>,
}

impl SourceConfig {
    /// A source with inferred format and identity column mapping.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            format: None,
            columns: BTreeMap::new(),
            sheet: None,
        }
    }

    /// Add a `source column -> canonical field` mapping.
    #[must_use]
    pub fn map_column(mut self, source: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.columns.insert(source.into(), canonical.into());
        self
    }

    /// The column map used by the normalizer.
    pub fn column_map(&self) -> ColumnMap {
        ColumnMap::new(self.columns.iter().map(|(s, c)| (s.clone(), c.clone())))
    }

    /// The Excel sheet selection for this source.
    pub fn sheet_selection(&self) -> ExcelSheetSelection {
        match &self.sheet {
            Some(name) => ExcelSheetSelection::Sheet(name.clone()),
            None => ExcelSheetSelection::First,
        }
    }
}

/// Format-check options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationOptions {
    /// Reject ISBNs whose check digit is wrong (shape is always checked).
    #[serde(default = "default_true")]
    pub verify_isbn_checksum: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            verify_isbn_checksum: true,
        }
    }
}

/// Output target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Path of the consolidated file.
    pub path: PathBuf,
    /// Output format; inferred from the extension when omitted.
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

fn default_merge_keys() -> Vec<Vec<String>> {
    vec![
        vec!["isbn".to_string()],
        vec!["title".to_string(), "author".to_string()],
    ]
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    /// Parse and check a TOML configuration.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and check a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_toml_str(&text)
    }

    /// The configuration compiled into the binary.
    pub fn embedded() -> ConfigResult<Self> {
        Self::from_toml_str(EMBEDDED_CONFIG)
    }

    /// The canonical schema.
    pub fn canonical(&self) -> CanonicalSchema {
        CanonicalSchema::new(self.schema.clone())
    }

    /// Validation rules derived from `required_fields` and `validation`.
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            required_fields: self.required_fields.clone(),
            verify_isbn_checksum: self.validation.verify_isbn_checksum,
        }
    }

    /// The configured merge-key strategies, or the default ones the schema can support.
    pub fn merge_strategies(&self) -> Vec<Vec<String>> {
        match &self.merge_keys {
            Some(strategies) => strategies.clone(),
            None => default_merge_keys()
                .into_iter()
                .filter(|strategy| {
                    strategy
                        .iter()
                        .all(|field| self.schema.iter().any(|f| &f.name == field))
                })
                .collect(),
        }
    }

    /// Merge options derived from `merge_keys` and `priority`.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            strategies: self.merge_strategies(),
            priority: self.priority.clone(),
        }
    }

    /// Check internal consistency: every name must refer to something that exists.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.schema.is_empty() {
            return invalid("schema must declare at least one field");
        }
        let mut field_names = HashSet::new();
        for field in &self.schema {
            if field.name.trim().is_empty() {
                return invalid("schema field names must not be empty");
            }
            if !field_names.insert(field.name.as_str()) {
                return invalid(format!("duplicate schema field '{}'", field.name));
            }
            if field.fill.is_some() && field.coerced_fill().is_none() {
                return invalid(format!(
                    "fill value of field '{}' does not fit its coercion",
                    field.name
                ));
            }
        }

        if self.sources.is_empty() {
            return invalid("at least one source is required");
        }
        let mut source_names = HashSet::new();
        for source in &self.sources {
            if !source_names.insert(source.name.as_str()) {
                return invalid(format!("duplicate source name '{}'", source.name));
            }
            for (column, target) in &source.columns {
                if !field_names.contains(target.as_str()) {
                    return invalid(format!(
                        "source '{}' maps column '{column}' to unknown field '{target}'",
                        source.name
                    ));
                }
            }
        }

        for field in &self.required_fields {
            if !field_names.contains(field.as_str()) {
                return invalid(format!("required field '{field}' is not in the schema"));
            }
        }

        let mut ranked = HashSet::new();
        for name in &self.priority {
            if !source_names.contains(name.as_str()) {
                return invalid(format!("priority names unknown source '{name}'"));
            }
            if !ranked.insert(name.as_str()) {
                return invalid(format!("source '{name}' appears twice in priority"));
            }
        }

        for strategy in self.merge_keys.iter().flatten() {
            if strategy.is_empty() {
                return invalid("merge key strategies must name at least one field");
            }
            for field in strategy {
                if !field_names.contains(field.as_str()) {
                    return invalid(format!("merge key field '{field}' is not in the schema"));
                }
            }
        }

        Ok(())
    }
}

fn invalid<T>(message: impl Into<String>) -> ConfigResult<T> {
    Err(ConfigError::Invalid {
        message: message.into(),
    })
}
