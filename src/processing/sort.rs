//! Row ordering by (category, visit timestamp).

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::types::{DataSet, Value};

use super::datetime::parse_day_first_datetime;

/// A computed row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    /// New row `i` is old row `order[i]`.
    pub order: Vec<usize>,
    /// Old row indices whose date/time cells were present but did not form a timestamp.
    pub unparsed: Vec<usize>,
}

/// Composite sort key. `None` parts sort after every `Some`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VisitKey {
    category: Option<String>,
    timestamp: Option<NaiveDateTime>,
}

impl Ord for VisitKey {
    fn cmp(&self, other: &Self) -> Ordering {
        missing_last(&self.category, &other.category)
            .then_with(|| missing_last(&self.timestamp, &other.timestamp))
    }
}

impl PartialOrd for VisitKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn missing_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compute a stable ascending order by category text, then by the timestamp formed from
/// `"<date> <time>"` parsed day-first.
///
/// Rows whose timestamp cannot be derived sort after the parseable rows of their category;
/// rows with no category sort last. Returns `None` unless all three columns are present.
pub fn visit_order(
    dataset: &DataSet,
    category_column: &str,
    date_column: &str,
    time_column: &str,
) -> Option<SortOrder> {
    let category_idx = dataset.schema.index_of(category_column)?;
    let date_idx = dataset.schema.index_of(date_column)?;
    let time_idx = dataset.schema.index_of(time_column)?;

    let mut unparsed = Vec::new();
    let keys: Vec<VisitKey> = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let timestamp = visit_timestamp(&row[date_idx], &row[time_idx]);
            if timestamp.is_none() && !(row[date_idx].is_null() && row[time_idx].is_null()) {
                unparsed.push(idx);
            }
            VisitKey {
                category: row[category_idx].as_str().map(str::to_owned),
                timestamp,
            }
        })
        .collect();

    let mut order: Vec<usize> = (0..keys.len()).collect();
    // `sort_by` is stable, so equal keys keep their input order.
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    Some(SortOrder { order, unparsed })
}

fn visit_timestamp(date: &Value, time: &Value) -> Option<NaiveDateTime> {
    let (date, time) = (date.as_str()?, time.as_str()?);
    parse_day_first_datetime(&format!("{date} {time}"))
}

/// Sort rows in place. Returns `false` (and leaves the rows untouched) when a column is absent.
pub fn sort_visits(
    dataset: &mut DataSet,
    category_column: &str,
    date_column: &str,
    time_column: &str,
) -> bool {
    match visit_order(dataset, category_column, date_column, time_column) {
        Some(sorted) => {
            dataset.reorder_rows(&sorted.order);
            true
        }
        None => false,
    }
}
