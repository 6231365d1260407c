use audit_report_mapper::ingestion::csv::{
    load_csv_from_bytes, load_csv_from_path, load_csv_from_reader,
};
use audit_report_mapper::types::Value;
use audit_report_mapper::MapperError;

#[test]
fn load_csv_from_path_happy_path() {
    let loaded = load_csv_from_path("tests/fixtures/asda_export.csv").unwrap();
    let ds = loaded.dataset;

    assert_eq!(ds.row_count(), 6);
    assert_eq!(ds.schema.len(), 15);
    assert_eq!(ds.schema.index_of("order_internal_id"), Some(0));
    assert!(ds.schema.contains(
        "Did the store colleague who served you at the fireworks cabinet, hand over the restricted item without providing ID?"
    ));
    assert_eq!(ds.rows[0][0], Value::text("1001"));
    // Trailing empty answers load as unset.
    assert_eq!(ds.rows[0][14], Value::Null);
    assert!(loaded.warnings.is_empty());
}

#[test]
fn load_csv_from_reader_accepts_other_delimiters() {
    let input = "id;name\n1;Ada\n";
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(input.as_bytes());

    let ds = load_csv_from_reader(&mut rdr).unwrap().dataset;
    assert_eq!(ds.schema.columns, vec!["id", "name"]);
    assert_eq!(ds.rows[0], vec![Value::text("1"), Value::text("Ada")]);
}

#[test]
fn header_only_input_has_columns_but_no_rows() {
    let ds = load_csv_from_bytes(b"a,b,c\n").unwrap().dataset;
    assert_eq!(ds.schema.len(), 3);
    assert_eq!(ds.row_count(), 0);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_csv_from_path("tests/fixtures/does_not_exist.csv").unwrap_err();
    assert!(matches!(err, MapperError::Io(_)), "{err:?}");
}

#[test]
fn non_utf8_input_is_a_parse_error() {
    let err = load_csv_from_bytes(b"id,name\n1,\xC3\x28\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("failed to parse input"), "{msg}");
}
