use std::fs;

use book_data_merge::LoadError;
#[cfg(feature = "excel")]
use book_data_merge::ingestion::ExcelSheetSelection;
use book_data_merge::ingestion::{IngestionFormat, IngestionOptions, ingest_from_path};
use book_data_merge::types::Value;

#[test]
fn unified_csv_and_json_by_extension() {
    let csv = ingest_from_path("tests/fixtures/books_a.csv", &IngestionOptions::default()).unwrap();
    assert_eq!(csv.row_count(), 1);
    assert_eq!(csv.value(0, "ISBN"), Some(&Value::Utf8("978-0-13-468599-1".to_string())));

    let json = ingest_from_path("tests/fixtures/books_b.json", &IngestionOptions::default()).unwrap();
    assert_eq!(json.row_count(), 1);
    assert_eq!(json.value(0, "Author"), Some(&Value::Utf8("Robert Martin".to_string())));
}

#[test]
fn unified_forced_format_overrides_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.export");
    fs::write(&path, "isbn,title\n9780306406157,Signals\n").unwrap();

    let err = ingest_from_path(&path, &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat { .. }));

    let opts = IngestionOptions {
        format: Some(IngestionFormat::Csv),
        ..Default::default()
    };
    let ds = ingest_from_path(&path, &opts).unwrap();
    assert_eq!(ds.row_count(), 1);
}

#[test]
fn unified_unknown_extension_is_unsupported() {
    let err = ingest_from_path("tests/fixtures/books.parquet", &IngestionOptions::default()).unwrap_err();
    assert!(err.to_string().contains("cannot infer format from extension 'parquet'"));
}

#[cfg(feature = "excel")]
#[test]
fn unified_excel_with_sheet_selection() {
    use rust_xlsxwriter::Workbook;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.xlsx");
    let mut wb = Workbook::new();
    wb.add_worksheet().write_string(0, 0, "cover").unwrap();
    let ws = wb.add_worksheet();
    ws.set_name("Books").unwrap();
    ws.write_string(0, 0, "title").unwrap();
    ws.write_string(1, 0, "Emma").unwrap();
    wb.save(&path).unwrap();

    let opts = IngestionOptions {
        excel_sheet_selection: ExcelSheetSelection::Sheet("Books".to_string()),
        ..Default::default()
    };
    let ds = ingest_from_path(&path, &opts).unwrap();
    assert_eq!(ds.value(0, "title"), Some(&Value::Utf8("Emma".to_string())));
}
