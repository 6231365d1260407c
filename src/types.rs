//! Core data model types.
//!
//! An audit export is loaded into an in-memory [`DataSet`]: an ordered [`Schema`] of column
//! names plus row-major [`Value`] storage. The same type carries the projected output table.

use std::fmt;

/// Ordered list of column names.
///
/// Names are unique within one schema; the loader renames duplicate headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Ordered column names.
    pub columns: Vec<String>,
}

impl Schema {
    /// Create a new schema from column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns `true` if a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// A single cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Value {
    /// Missing / unset.
    #[default]
    Null,
    /// Cell text, kept verbatim.
    Utf8(String),
}

impl Value {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Utf8(s.into())
    }

    /// Borrow the text, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::Utf8(s) => Some(s.as_str()),
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for `Null` and for the empty string.
    pub fn is_blank(&self) -> bool {
        self.as_str().is_none_or(str::is_empty)
    }

    /// Returns `true` if this is text exactly equal to `other`.
    pub fn eq_text(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] columns; every row
/// holds exactly `schema.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    ///
    /// # Panics
    ///
    /// Panics if any row length differs from the schema column count.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        let expected_len = schema.len();
        for (idx, row) in rows.iter().enumerate() {
            assert!(
                row.len() == expected_len,
                "row {} length {} does not match schema length {}",
                idx,
                row.len(),
                expected_len
            );
        }
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (`row`, `col`).
    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    /// Iterate the values of one column.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[col])
    }

    /// Keep only rows for which `predicate` returns `true`, preserving order.
    pub fn retain_rows<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| predicate(row.as_slice()));
    }

    /// Keep row `i` only when `keep[i]` is `true`. Returns the number of rows removed.
    ///
    /// # Panics
    ///
    /// Panics if `keep.len()` differs from the row count.
    pub fn retain_by_mask(&mut self, keep: &[bool]) -> usize {
        assert!(
            keep.len() == self.rows.len(),
            "mask length {} does not match row count {}",
            keep.len(),
            self.rows.len()
        );
        let before = self.rows.len();
        let mut mask = keep.iter();
        self.rows.retain(|_| mask.next().copied().unwrap_or(true));
        before - self.rows.len()
    }

    /// Reorder rows so that new row `i` is old row `order[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a permutation of `0..row_count()`.
    pub fn reorder_rows(&mut self, order: &[usize]) {
        assert!(
            order.len() == self.rows.len(),
            "row order length {} does not match row count {}",
            order.len(),
            self.rows.len()
        );
        let mut old: Vec<Option<Vec<Value>>> = self.rows.drain(..).map(Some).collect();
        self.rows = order
            .iter()
            .map(|&i| old[i].take().expect("row order must be a permutation"))
            .collect();
    }

    /// Replace column `name` with `values`, appending it when absent. Returns the column index.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count.
    pub fn upsert_column(&mut self, name: &str, values: Vec<Value>) -> usize {
        assert!(
            values.len() == self.rows.len(),
            "column '{}' has {} values for {} rows",
            name,
            values.len(),
            self.rows.len()
        );
        match self.schema.index_of(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
                idx
            }
            None => {
                self.schema.columns.push(name.to_owned());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
                self.schema.len() - 1
            }
        }
    }
}
