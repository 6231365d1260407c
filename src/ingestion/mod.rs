//! Loading raw audit exports.
//!
//! Exports arrive as delimited text with a header row. [`csv::load_csv_from_bytes`] turns them
//! into an in-memory [`crate::types::DataSet`] without interpreting any cell: every value stays
//! text, and typing (dates, times) happens in the processing stages that need it.

pub mod csv;

pub use self::csv::{load_csv_from_bytes, load_csv_from_path, load_csv_from_reader, LoadedTable};
