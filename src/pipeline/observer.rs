use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FieldParseWarning, Severity};

use super::PipelineStats;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    AbortFilter,
    CutoffFilter,
    Sort,
    Reconcile,
    Project,
    RenamePlaceholders,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::AbortFilter => "abort_filter",
            Stage::CutoffFilter => "cutoff_filter",
            Stage::Sort => "sort",
            Stage::Reconcile => "reconcile",
            Stage::Project => "project",
            Stage::RenamePlaceholders => "rename_placeholders",
        };
        f.write_str(name)
    }
}

/// Events emitted by [`super::Pipeline::run`].
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted,
    StageFinished {
        stage: Stage,
        rows_in: usize,
        rows_out: usize,
    },
    /// The stage's governing column is absent, so it did nothing.
    StageSkipped { stage: Stage, missing_column: String },
    FieldWarning(FieldParseWarning),
    RunFinished {
        elapsed: Duration,
        stats: PipelineStats,
    },
    RunFailed { severity: Severity, message: String },
}

/// Observer hook for pipeline events.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards events to `tracing`. Used when no other observer is attached.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted => tracing::debug!("pipeline run started"),
            PipelineEvent::StageFinished {
                stage,
                rows_in,
                rows_out,
            } => tracing::info!(%stage, rows_in, rows_out, "stage finished"),
            PipelineEvent::StageSkipped {
                stage,
                missing_column,
            } => tracing::debug!(%stage, missing_column, "stage skipped: column absent"),
            PipelineEvent::FieldWarning(w) => tracing::warn!(
                row = w.row,
                column = %w.column,
                raw = %w.raw,
                "{}",
                w.reason
            ),
            PipelineEvent::RunFinished { elapsed, stats } => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                rows_loaded = stats.rows_loaded,
                rows_out = stats.rows_out,
                columns_out = stats.columns_out,
                warnings = stats.warnings,
                "pipeline finished"
            ),
            PipelineEvent::RunFailed { severity, message } => {
                tracing::error!(?severity, "pipeline failed: {message}")
            }
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
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
    fn on_event(&self, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}
