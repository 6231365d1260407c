//! CSV export of the final output table.

use std::io::Write;
use std::path::Path;

use crate::error::MapperResult;
use crate::types::DataSet;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `table` as UTF-8 CSV with a leading byte-order marker, so spreadsheet tools detect
/// the encoding of non-ASCII answers.
///
/// Column and row order are preserved; unset values are written as empty fields.
pub fn write_csv<W: Write>(table: &DataSet, mut writer: W) -> MapperResult<()> {
    writer.write_all(UTF8_BOM)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(&table.schema.columns)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.as_str().unwrap_or("")))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `table` to CSV bytes (see [`write_csv`]).
pub fn to_csv_bytes(table: &DataSet) -> MapperResult<Vec<u8>> {
    let mut out = Vec::new();
    write_csv(table, &mut out)?;
    Ok(out)
}

/// Write `table` to a file at `path`, replacing any existing file.
pub fn write_csv_to_path(table: &DataSet, path: impl AsRef<Path>) -> MapperResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(table, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Schema, Value};

    #[test]
    fn writes_bom_header_and_rows() {
        let table = DataSet::new(
            Schema::new(["name", "_blank_1", "note"]),
            vec![
                vec![Value::text("Zoë"), Value::text(""), Value::Null],
                vec![Value::text("a,b"), Value::text(""), Value::text("say \"hi\"")],
            ],
        );
        let bytes = to_csv_bytes(&table).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(
            text,
            "name,_blank_1,note\nZoë,,\n\"a,b\",,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn header_only_for_empty_tables() {
        let table = DataSet::new(Schema::new(["a", "b"]), Vec::new());
        let bytes = to_csv_bytes(&table).unwrap();
        assert_eq!(&bytes[UTF8_BOM.len()..], b"a,b\n");
    }

    #[test]
    fn output_loads_back_unchanged() {
        let table = DataSet::new(
            Schema::new(["q", "a"]),
            vec![vec![Value::text("Fireworks - No ID"), Value::text("línea\nnueva")]],
        );
        let bytes = to_csv_bytes(&table).unwrap();
        let loaded = crate::ingestion::csv::load_csv_from_bytes(&bytes).unwrap();
        assert_eq!(loaded.dataset, table);
    }
}
