//! The transformation pipeline.
//!
//! [`Pipeline::run`] takes raw CSV bytes and a run date and performs, in order:
//!
//! 1. load ([`crate::ingestion::csv`])
//! 2. drop aborted visits, then visits after the most recent Friday
//! 3. sort by (category, visit timestamp)
//! 4. apply the reconciliation rules
//! 5. project through the schema mapping
//! 6. rename and blank placeholder columns
//!
//! The run is single-threaded and owns its working table. Only tokenizing the input can fail;
//! every later stage is total and reports bad cells as [`FieldParseWarning`]s.

mod observer;

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::error::{FieldParseWarning, MapperResult};
use crate::export;
use crate::ingestion::csv::{load_csv_from_bytes, LoadedTable};
use crate::processing::{
    abort_mask, cutoff_mask, most_recent_friday, project, reconcile, rename_placeholders,
    visit_order, PlaceholderColumn,
};
use crate::types::DataSet;

pub use observer::{CompositeObserver, PipelineEvent, PipelineObserver, Stage, TracingObserver};

/// Counters describing one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub rows_loaded: usize,
    pub aborted_removed: usize,
    pub after_cutoff_removed: usize,
    /// Most recent Friday on or before the run date.
    pub cutoff: NaiveDate,
    /// `false` when a sort column was absent and input order was kept.
    pub sorted: bool,
    pub rows_out: usize,
    pub columns_out: usize,
    pub placeholders: usize,
    pub warnings: usize,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Final table with display column names.
    pub table: DataSet,
    /// Placeholder columns whose values are forced empty.
    pub placeholders: Vec<PlaceholderColumn>,
    pub warnings: Vec<FieldParseWarning>,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// Render the table as UTF-8 CSV with a byte-order marker.
    pub fn to_csv_bytes(&self) -> MapperResult<Vec<u8>> {
        export::to_csv_bytes(&self.table)
    }

    /// Stream the table as UTF-8 CSV with a byte-order marker.
    pub fn write_csv<W: Write>(&self, writer: W) -> MapperResult<()> {
        export::write_csv(&self.table, writer)
    }
}

/// A validated pipeline configuration plus an observer.
pub struct Pipeline {
    config: PipelineConfig,
    observer: Arc<dyn PipelineObserver>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("mapping_columns", &self.config.mapping.len())
            .field("reconciliation_rules", &self.config.reconciliation.len())
            .finish()
    }
}

impl Pipeline {
    /// Validate `config` and build a pipeline that logs through [`TracingObserver`].
    pub fn new(config: PipelineConfig) -> MapperResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load `input` and transform it. `today` is the run date used for the cutoff.
    pub fn run(&self, input: &[u8], today: NaiveDate) -> MapperResult<PipelineOutput> {
        self.emit(PipelineEvent::RunStarted);
        match load_csv_from_bytes(input) {
            Ok(loaded) => Ok(self.run_loaded(loaded, today)),
            Err(err) => {
                self.emit(PipelineEvent::RunFailed {
                    severity: err.severity(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Transform an already loaded table.
    pub fn run_dataset(&self, dataset: DataSet, today: NaiveDate) -> PipelineOutput {
        self.run_loaded(
            LoadedTable {
                dataset,
                warnings: Vec::new(),
            },
            today,
        )
    }

    fn run_loaded(&self, loaded: LoadedTable, today: NaiveDate) -> PipelineOutput {
        let start = Instant::now();
        let LoadedTable {
            dataset: mut ds,
            mut warnings,
        } = loaded;
        let rows_loaded = ds.row_count();
        for w in &warnings {
            self.emit(PipelineEvent::FieldWarning(w.clone()));
        }
        self.emit(PipelineEvent::StageFinished {
            stage: Stage::Load,
            rows_in: rows_loaded,
            rows_out: rows_loaded,
        });

        // 1-based input row number of every working row, for warnings.
        let mut origin: Vec<usize> = (1..=rows_loaded).collect();
        let filter = &self.config.filter;

        let aborted_removed = match abort_mask(&ds, &filter.result_column, &filter.abort_value) {
            Some(keep) => self.apply_mask(Stage::AbortFilter, &mut ds, &mut origin, &keep),
            None => {
                self.skipped(Stage::AbortFilter, &filter.result_column);
                0
            }
        };

        let cutoff = most_recent_friday(today);
        let after_cutoff_removed = match cutoff_mask(&ds, &filter.visit_date_column, cutoff) {
            Some(mask) => {
                let col = ds.schema.index_of(&filter.visit_date_column);
                for &row in &mask.unparsed {
                    let raw = col.map(|c| ds.value(row, c).to_string()).unwrap_or_default();
                    self.warn(
                        &mut warnings,
                        FieldParseWarning {
                            row: origin[row],
                            column: filter.visit_date_column.clone(),
                            raw,
                            reason: "unparseable visit date; row kept".to_string(),
                        },
                    );
                }
                self.apply_mask(Stage::CutoffFilter, &mut ds, &mut origin, &mask.keep)
            }
            None => {
                self.skipped(Stage::CutoffFilter, &filter.visit_date_column);
                0
            }
        };

        let sort = &self.config.sort;
        let order = visit_order(
            &ds,
            &sort.category_column,
            &sort.date_column,
            &sort.time_column,
        );
        let sorted = match order {
            Some(order) => {
                for &row in &order.unparsed {
                    let raw = [&sort.date_column, &sort.time_column]
                        .iter()
                        .filter_map(|c| ds.schema.index_of(c))
                        .map(|c| ds.value(row, c).to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    self.warn(
                        &mut warnings,
                        FieldParseWarning {
                            row: origin[row],
                            column: format!("{} + {}", sort.date_column, sort.time_column),
                            raw,
                            reason: "unparseable visit timestamp; sorted last in its category"
                                .to_string(),
                        },
                    );
                }
                ds.reorder_rows(&order.order);
                origin = order.order.iter().map(|&i| origin[i]).collect();
                self.emit(PipelineEvent::StageFinished {
                    stage: Stage::Sort,
                    rows_in: ds.row_count(),
                    rows_out: ds.row_count(),
                });
                true
            }
            None => {
                let missing = [&sort.category_column, &sort.date_column, &sort.time_column]
                    .into_iter()
                    .find(|c| !ds.schema.contains(c))
                    .cloned()
                    .unwrap_or_default();
                self.skipped(Stage::Sort, &missing);
                false
            }
        };

        for rule in &self.config.reconciliation {
            let outcome = reconcile(&mut ds, rule);
            tracing::debug!(
                target_column = %rule.target,
                candidates_present = outcome.candidates_present,
                rows_in_scope = outcome.rows_in_scope,
                "reconciled"
            );
        }
        self.emit(PipelineEvent::StageFinished {
            stage: Stage::Reconcile,
            rows_in: ds.row_count(),
            rows_out: ds.row_count(),
        });

        let mut table = project(&ds, &self.config.mapping);
        self.emit(PipelineEvent::StageFinished {
            stage: Stage::Project,
            rows_in: ds.row_count(),
            rows_out: table.row_count(),
        });

        let placeholders = rename_placeholders(&mut table, &self.config.placeholder);
        self.emit(PipelineEvent::StageFinished {
            stage: Stage::RenamePlaceholders,
            rows_in: table.row_count(),
            rows_out: table.row_count(),
        });

        let stats = PipelineStats {
            rows_loaded,
            aborted_removed,
            after_cutoff_removed,
            cutoff,
            sorted,
            rows_out: table.row_count(),
            columns_out: table.schema.len(),
            placeholders: placeholders.len(),
            warnings: warnings.len(),
        };
        self.emit(PipelineEvent::RunFinished {
            elapsed: start.elapsed(),
            stats,
        });

        PipelineOutput {
            table,
            placeholders,
            warnings,
            stats,
        }
    }

    fn apply_mask(
        &self,
        stage: Stage,
        ds: &mut DataSet,
        origin: &mut Vec<usize>,
        keep: &[bool],
    ) -> usize {
        let rows_in = ds.row_count();
        let removed = ds.retain_by_mask(keep);
        let mut mask = keep.iter();
        origin.retain(|_| mask.next().copied().unwrap_or(true));
        self.emit(PipelineEvent::StageFinished {
            stage,
            rows_in,
            rows_out: ds.row_count(),
        });
        removed
    }

    fn skipped(&self, stage: Stage, missing_column: &str) {
        self.emit(PipelineEvent::StageSkipped {
            stage,
            missing_column: missing_column.to_owned(),
        });
    }

    fn warn(&self, warnings: &mut Vec<FieldParseWarning>, warning: FieldParseWarning) {
        self.emit(PipelineEvent::FieldWarning(warning.clone()));
        warnings.push(warning);
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }
}

/// Transform CSV bytes with `config` and render the result as CSV bytes.
pub fn transform_csv(
    input: &[u8],
    config: &PipelineConfig,
    today: NaiveDate,
) -> MapperResult<Vec<u8>> {
    Pipeline::new(config.clone())?.run(input, today)?.to_csv_bytes()
}
