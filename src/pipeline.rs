//! End-to-end run: pre-flight → load → normalize → validate → merge → write.
//!
//! [`run`] is the entry point used by the binary. The stages are also exposed separately:
//! [`preflight`] and [`load_sources`] touch the filesystem, [`consolidate`] is pure apart from
//! observer callbacks, and the write goes through [`crate::output::write_to_path`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span};

use crate::config::PipelineConfig;
use crate::error::{LoadError, LoadResult, PipelineError, PipelineResult};
use crate::ingestion::{IngestionOptions, ingest_from_path};
use crate::observability::{PipelineObserver, Severity, TracingObserver};
use crate::output::{WriteOptions, write_to_path};
use crate::processing::{MergeInput, MergeReport, merge, normalize, validate};
use crate::types::DataSet;

/// Options for [`run`].
#[derive(Clone)]
pub struct RunOptions {
    /// Receives every pipeline event.
    pub observer: Arc<dyn PipelineObserver>,
    /// Run every stage except the final write.
    pub dry_run: bool,
    /// Load failures at or above this severity are also reported through `on_alert`.
    pub alert_at_or_above: Severity,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            observer: Arc::new(TracingObserver),
            dry_run: false,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("dry_run", &self.dry_run)
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish_non_exhaustive()
    }
}

/// A loaded, not yet normalized dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    pub name: String,
    pub data: DataSet,
}

/// Per-dataset counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub name: String,
    pub path: PathBuf,
    /// Records read from the file.
    pub loaded: usize,
    /// Values that failed coercion and became missing.
    pub degraded: usize,
    /// Records that passed validation.
    pub valid: usize,
    /// Records excluded by validation.
    pub rejected: usize,
}

/// The consolidated table plus what happened on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidated {
    pub table: DataSet,
    pub sources: Vec<SourceSummary>,
    pub merge: MergeReport,
}

/// Result of a successful [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub sources: Vec<SourceSummary>,
    pub merge: MergeReport,
    /// Records in the consolidated table.
    pub output_rows: usize,
    pub output_path: PathBuf,
    /// False for dry runs.
    pub written: bool,
}

impl RunSummary {
    pub fn total_loaded(&self) -> usize {
        self.sources.iter().map(|s| s.loaded).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.sources.iter().map(|s| s.rejected).sum()
    }

    pub fn total_degraded(&self) -> usize {
        self.sources.iter().map(|s| s.degraded).sum()
    }
}

/// Fail with [`LoadError::MissingSources`] naming every configured source file that does not
/// exist.
pub fn preflight(config: &PipelineConfig) -> LoadResult<()> {
    let missing: Vec<PathBuf> = config
        .sources
        .iter()
        .filter(|s| !s.path.exists())
        .map(|s| s.path.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingSources { paths: missing })
    }
}

/// Load every configured source in order. The first failure aborts.
pub fn load_sources(config: &PipelineConfig, options: &RunOptions) -> PipelineResult<Vec<LoadedSource>> {
    config
        .sources
        .iter()
        .map(|source| {
            let ingest = IngestionOptions {
                format: source.format,
                excel_sheet_selection: source.sheet_selection(),
                observer: Some(options.observer.clone()),
                alert_at_or_above: options.alert_at_or_above,
            };
            let data = info_span!("load", source = %source.name)
                .in_scope(|| ingest_from_path(&source.path, &ingest))
                .map_err(|error| PipelineError::Load {
                    dataset: source.name.clone(),
                    error,
                })?;
            Ok(LoadedSource {
                name: source.name.clone(),
                data,
            })
        })
        .collect()
}

/// Normalize, validate and merge loaded datasets.
///
/// `loaded` is in load order, which is also the merge tie-break order. Datasets whose name is not a
/// configured source are skipped.
pub fn consolidate(
    config: &PipelineConfig,
    loaded: &[LoadedSource],
    observer: &dyn PipelineObserver,
) -> Consolidated {
    let canonical = config.canonical();
    let rules = config.validation_rules();

    let mut sources = Vec::with_capacity(loaded.len());
    let mut valid_sets: Vec<(&str, DataSet)> = Vec::with_capacity(loaded.len());
    for source in loaded {
        let Some(source_config) = config.sources.iter().find(|s| s.name == source.name) else {
            continue;
        };
        let span = info_span!("normalize", source = %source.name);
        let normalized = span.in_scope(|| normalize(&source.data, &source_config.column_map(), &canonical));
        for degraded in &normalized.degraded {
            observer.on_degraded(&source.name, degraded);
        }

        let validation = info_span!("validate", source = %source.name)
            .in_scope(|| validate(&normalized.data, &canonical, &rules));
        for rejection in &validation.rejected {
            observer.on_rejected(&source.name, rejection);
        }

        info!(
            source = %source.name,
            loaded = source.data.row_count(),
            degraded = normalized.degraded.len(),
            valid = validation.valid.row_count(),
            rejected = validation.rejected.len(),
            "dataset cleaned"
        );
        sources.push(SourceSummary {
            name: source.name.clone(),
            path: source_config.path.clone(),
            loaded: source.data.row_count(),
            degraded: normalized.degraded.len(),
            valid: validation.valid.row_count(),
            rejected: validation.rejected.len(),
        });
        valid_sets.push((source.name.as_str(), validation.valid));
    }

    let inputs: Vec<MergeInput<'_>> = valid_sets
        .iter()
        .map(|(source, data)| MergeInput { source: *source, data })
        .collect();
    let merge_start = Instant::now();
    let merged = info_span!("merge").in_scope(|| merge(&inputs, &canonical, &config.merge_options()));
    for conflict in &merged.report.conflicts {
        observer.on_conflict(conflict);
    }
    info!(
        input_records = merged.report.input_records,
        groups = merged.report.groups,
        keyless = merged.report.keyless_records,
        conflicts = merged.report.conflicts.len(),
        filled = merged.report.filled,
        duration_ms = merge_start.elapsed().as_millis(),
        "merge complete"
    );

    Consolidated {
        table: merged.table,
        sources,
        merge: merged.report,
    }
}

/// Run the whole pipeline described by `config`.
///
/// Nothing is written unless every stage before the write succeeds, and the write itself is
/// atomic, so a failed run leaves an existing output file as it was.
pub fn run(config: &PipelineConfig, options: &RunOptions) -> PipelineResult<RunSummary> {
    let run_start = Instant::now();
    config.validate()?;
    preflight(config).map_err(PipelineError::Preflight)?;

    let loaded = load_sources(config, options)?;
    let consolidated = consolidate(config, &loaded, &*options.observer);
    let output_rows = consolidated.table.row_count();
    let output_path = config.output.path.clone();

    let written = if options.dry_run {
        info!(path = %output_path.display(), rows = output_rows, "output skipped (dry run)");
        false
    } else {
        let write = WriteOptions {
            format: config.output.format,
        };
        info_span!("write", path = %output_path.display())
            .in_scope(|| write_to_path(&consolidated.table, &output_path, &write))?;
        options.observer.on_written(&output_path, output_rows);
        true
    };

    info!(
        sources = consolidated.sources.len(),
        output_rows,
        duration_ms = run_start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunSummary {
        sources: consolidated.sources,
        merge: consolidated.merge,
        output_rows,
        output_path,
        written,
    })
}
