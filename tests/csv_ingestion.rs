use book_data_merge::LoadError;
use book_data_merge::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader};
use book_data_merge::types::{DataType, Value};

fn utf8(s: &str) -> Value {
    Value::Utf8(s.to_string())
}

#[test]
fn ingest_csv_from_path_keeps_raw_trimmed_strings() {
    let ds = ingest_csv_from_path("tests/fixtures/goodreads_books.csv").unwrap();

    assert_eq!(ds.row_count(), 5);
    let names: Vec<&str> = ds.schema.field_names().collect();
    assert_eq!(
        names,
        vec![
            "book_id",
            "isbn",
            "isbn13",
            "authors",
            "original_publication_year",
            "title",
            "average_rating"
        ]
    );
    assert!(ds.schema.fields.iter().all(|f| f.data_type == DataType::Raw));

    // Cells stay text; only surrounding whitespace is removed.
    assert_eq!(ds.value(0, "isbn"), Some(&utf8("439023483")));
    assert_eq!(ds.value(0, "isbn13"), Some(&utf8("9.78043902348e+12")));
    assert_eq!(
        ds.value(1, "title"),
        Some(&utf8("harry potter and the   sorcerer's stone"))
    );
    assert_eq!(ds.value(1, "authors"), Some(&utf8("J.K. Rowling, Mary GrandPré")));
    assert_eq!(ds.value(1, "isbn"), Some(&Value::Null));
    assert_eq!(ds.value(2, "average_rating"), Some(&Value::Null));
}

#[test]
fn ingest_csv_tolerates_ragged_rows() {
    let ds = ingest_csv_from_path("tests/fixtures/ragged.csv").unwrap();

    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.rows[0], vec![utf8("9780134685991"), utf8("Clean Code"), Value::Null]);
    // Cells beyond the header width are ignored.
    assert_eq!(ds.rows[1], vec![utf8("9780306406157"), utf8("Signals"), utf8("Someone")]);
}

#[test]
fn ingest_csv_errors_on_duplicate_headers() {
    let err = ingest_csv_from_path("tests/fixtures/duplicate_headers.csv").unwrap_err();
    assert!(matches!(err, LoadError::Malformed { .. }));
    assert!(err.to_string().contains("duplicate column 'title'"));
}

#[test]
fn ingest_csv_from_reader_strips_bom_and_header_whitespace() {
    let input = "\u{feff} ISBN , Title \n978-0-13-468599-1, clean code \n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(ds.schema.index_of("ISBN"), Some(0));
    assert_eq!(ds.schema.index_of("Title"), Some(1));
    assert_eq!(ds.rows[0], vec![utf8("978-0-13-468599-1"), utf8("clean code")]);
}

#[test]
fn ingest_csv_header_only_is_an_empty_dataset() {
    let input = "isbn,title\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(ds.schema.len(), 2);
    assert_eq!(ds.row_count(), 0);
}

#[test]
fn ingest_csv_missing_file_is_io_error() {
    let err = ingest_csv_from_path("tests/fixtures/does_not_exist.csv").unwrap_err();
    assert!(matches!(err, LoadError::Csv(_) | LoadError::Io(_)));
}
