//! Pipeline observers.
//!
//! Every stage reports what it did to a [`PipelineObserver`]: datasets loaded or failed, fields
//! degraded during normalization, records rejected by validation, merge conflicts, and the
//! written output. [`TracingObserver`] turns these into `tracing` events and is what the binary
//! uses; tests plug in their own recording observers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LoadError;
use crate::ingestion::IngestionFormat;
use crate::processing::{DegradedField, MergeConflict, Rejection};

/// Severity classification used for load-failure callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about a load attempt.
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// The input path.
    pub path: PathBuf,
    /// Format used for loading.
    pub format: IngestionFormat,
}

/// Stats reported on a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Number of loaded rows.
    pub rows: usize,
    /// Number of source columns.
    pub columns: usize,
}

/// Observer interface for pipeline events.
///
/// All methods default to no-ops. `source` is the configured dataset name.
pub trait PipelineObserver: Send + Sync {
    /// Called when a dataset is loaded.
    fn on_loaded(&self, _ctx: &LoadContext, _stats: LoadStats) {}

    /// Called when loading a dataset fails.
    fn on_load_failed(&self, _ctx: &LoadContext, _severity: Severity, _error: &LoadError) {}

    /// Called when a load failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_load_failed`].
    fn on_alert(&self, ctx: &LoadContext, severity: Severity, error: &LoadError) {
        self.on_load_failed(ctx, severity, error)
    }

    /// Called for every source value that failed coercion and became missing.
    fn on_degraded(&self, _source: &str, _degraded: &DegradedField) {}

    /// Called for every record the validator rejected.
    fn on_rejected(&self, _source: &str, _rejection: &Rejection) {}

    /// Called for every field conflict resolved by priority during merge.
    fn on_conflict(&self, _conflict: &MergeConflict) {}

    /// Called once the consolidated table is on disk.
    fn on_written(&self, _path: &Path, _rows: usize) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_loaded(&self, ctx: &LoadContext, stats: LoadStats) {
        for o in &self.observers {
            o.on_loaded(ctx, stats);
        }
    }

    fn on_load_failed(&self, ctx: &LoadContext, severity: Severity, error: &LoadError) {
        for o in &self.observers {
            o.on_load_failed(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &LoadContext, severity: Severity, error: &LoadError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_degraded(&self, source: &str, degraded: &DegradedField) {
        for o in &self.observers {
            o.on_degraded(source, degraded);
        }
    }

    fn on_rejected(&self, source: &str, rejection: &Rejection) {
        for o in &self.observers {
            o.on_rejected(source, rejection);
        }
    }

    fn on_conflict(&self, conflict: &MergeConflict) {
        for o in &self.observers {
            o.on_conflict(conflict);
        }
    }

    fn on_written(&self, path: &Path, rows: usize) {
        for o in &self.observers {
            o.on_written(path, rows);
        }
    }
}

/// Emits pipeline events as `tracing` events.
///
/// Loads and writes log at `info`, rejections at `warn`, degraded fields and merge conflicts at
/// `debug`. Load failures log once at `error`; an alert adds a `warn` event with `alert = true`
/// that does not repeat the error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_loaded(&self, ctx: &LoadContext, stats: LoadStats) {
        tracing::info!(
            path = %ctx.path.display(),
            format = ?ctx.format,
            rows = stats.rows,
            columns = stats.columns,
            "dataset loaded"
        );
    }

    fn on_load_failed(&self, ctx: &LoadContext, severity: Severity, error: &LoadError) {
        tracing::error!(
            path = %ctx.path.display(),
            format = ?ctx.format,
            severity = ?severity,
            error = %error,
            "dataset load failed"
        );
    }

    fn on_alert(&self, ctx: &LoadContext, severity: Severity, _error: &LoadError) {
        tracing::warn!(
            path = %ctx.path.display(),
            severity = ?severity,
            alert = true,
            "load failure reached the alert threshold"
        );
    }

    fn on_degraded(&self, source: &str, degraded: &DegradedField) {
        tracing::debug!(
            source,
            record = degraded.record,
            field = %degraded.field,
            raw = %degraded.raw,
            reason = %degraded.reason,
            "value could not be coerced; treated as missing"
        );
    }

    fn on_rejected(&self, source: &str, rejection: &Rejection) {
        tracing::warn!(
            source,
            record = rejection.record,
            reasons = %rejection.reasons_text(),
            "record rejected"
        );
    }

    fn on_conflict(&self, conflict: &MergeConflict) {
        tracing::debug!(
            key = %conflict.key,
            field = %conflict.field,
            kept = %conflict.kept,
            kept_from = %conflict.kept_from,
            discarded = %conflict.discarded,
            discarded_from = %conflict.discarded_from,
            "merge conflict resolved by priority"
        );
    }

    fn on_written(&self, path: &Path, rows: usize) {
        tracing::info!(path = %path.display(), rows, "consolidated dataset written");
    }
}
