//! CSV loading into an in-memory [`DataSet`].

use std::io::Read;
use std::path::Path;

use crate::error::{FieldParseWarning, MapperError, MapperResult};
use crate::types::{DataSet, Schema, Value};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A loaded table plus the non-fatal problems found while loading it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedTable {
    pub dataset: DataSet,
    pub warnings: Vec<FieldParseWarning>,
}

/// Load a CSV file into an in-memory [`DataSet`].
pub fn load_csv_from_path(path: impl AsRef<Path>) -> MapperResult<LoadedTable> {
    let bytes = std::fs::read(path)?;
    load_csv_from_bytes(&bytes)
}

/// Load CSV bytes (UTF-8, optionally with a byte-order marker) into a [`DataSet`].
///
/// Rules:
///
/// - The first record is the header row; header cells become column names verbatim.
/// - Empty input is a valid table with no columns and no rows.
/// - Empty cells, and cells missing from short rows, load as [`Value::Null`].
/// - Cells beyond the header width are dropped and reported as warnings.
pub fn load_csv_from_bytes(input: &[u8]) -> MapperResult<LoadedTable> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    load_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
///
/// The reader should be `flexible`; a strict reader turns ragged rows into a parse failure.
pub fn load_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> MapperResult<LoadedTable> {
    let headers = rdr.headers().map_err(tokenize_error)?.clone();
    let mut warnings = Vec::new();
    let schema = dedupe_headers(headers.iter(), &mut warnings);
    let width = schema.len();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let user_row = row_idx0 + 1;
        let record = result.map_err(tokenize_error)?;

        if record.len() > width {
            warnings.push(FieldParseWarning {
                row: user_row,
                column: String::new(),
                raw: record.iter().skip(width).collect::<Vec<_>>().join(","),
                reason: format!(
                    "row has {} cells but the header has {}; surplus cells dropped",
                    record.len(),
                    width
                ),
            });
        }

        let row = (0..width)
            .map(|idx| match record.get(idx) {
                None | Some("") => Value::Null,
                Some(raw) => Value::text(raw),
            })
            .collect();
        rows.push(row);
    }

    Ok(LoadedTable {
        dataset: DataSet::new(schema, rows),
        warnings,
    })
}

/// Duplicate header names get a `.N` suffix so every column stays addressable.
fn dedupe_headers<'a>(
    headers: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<FieldParseWarning>,
) -> Schema {
    let mut columns: Vec<String> = Vec::new();
    for header in headers {
        let mut name = header.to_owned();
        let mut n = 0;
        while columns.contains(&name) {
            n += 1;
            name = format!("{header}.{n}");
        }
        if n > 0 {
            warnings.push(FieldParseWarning {
                row: 0,
                column: name.clone(),
                raw: header.to_owned(),
                reason: "duplicate header renamed".to_string(),
            });
        }
        columns.push(name);
    }
    Schema { columns }
}

fn tokenize_error(err: csv::Error) -> MapperError {
    match err.kind() {
        csv::ErrorKind::Io(_) => MapperError::Csv(err),
        _ => MapperError::parse(err.to_string()),
    }
}
