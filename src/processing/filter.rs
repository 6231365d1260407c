//! Row filtering: aborted visits and visits after the reporting cutoff.
//!
//! Each predicate is computed as a keep-mask over the current rows and is `None` when its
//! governing column is absent, so callers can treat a missing column as a no-op.

use chrono::NaiveDate;

use crate::types::{DataSet, Value};

use super::datetime::parse_day_first_date;

/// Result of evaluating the cutoff predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoffMask {
    /// `true` for rows to keep.
    pub keep: Vec<bool>,
    /// Indices of rows whose visit date text could not be parsed. They are kept.
    pub unparsed: Vec<usize>,
}

/// Keep-mask that drops rows whose `result_column`, compared case-insensitively, equals
/// `abort_value`. Returns `None` when the column is absent.
pub fn abort_mask(dataset: &DataSet, result_column: &str, abort_value: &str) -> Option<Vec<bool>> {
    let idx = dataset.schema.index_of(result_column)?;
    let abort_value = abort_value.to_lowercase();
    Some(
        dataset
            .column_values(idx)
            .map(|v| !is_abort(v, &abort_value))
            .collect(),
    )
}

fn is_abort(value: &Value, abort_lower: &str) -> bool {
    value.as_str().is_some_and(|s| s.to_lowercase() == abort_lower)
}

/// Keep-mask that drops rows whose day-first `date_column` is strictly after `cutoff`.
///
/// Missing and unparseable dates never cause row loss: they are treated as on or before the
/// cutoff. Returns `None` when the column is absent.
pub fn cutoff_mask(dataset: &DataSet, date_column: &str, cutoff: NaiveDate) -> Option<CutoffMask> {
    let idx = dataset.schema.index_of(date_column)?;
    let mut unparsed = Vec::new();
    let keep = dataset
        .column_values(idx)
        .enumerate()
        .map(|(row, v)| match v.as_str() {
            None => true,
            Some(raw) => match parse_day_first_date(raw) {
                Some(date) => date <= cutoff,
                None => {
                    unparsed.push(row);
                    true
                }
            },
        })
        .collect();
    Some(CutoffMask { keep, unparsed })
}

/// Remove aborted visits in place. Returns the number of rows removed (0 when the column is
/// absent).
pub fn drop_aborted(dataset: &mut DataSet, result_column: &str, abort_value: &str) -> usize {
    match abort_mask(dataset, result_column, abort_value) {
        Some(keep) => dataset.retain_by_mask(&keep),
        None => 0,
    }
}

/// Remove visits dated after `cutoff` in place. Returns the number of rows removed.
pub fn drop_after_cutoff(dataset: &mut DataSet, date_column: &str, cutoff: NaiveDate) -> usize {
    match cutoff_mask(dataset, date_column, cutoff) {
        Some(mask) => dataset.retain_by_mask(&mask.keep),
        None => 0,
    }
}
