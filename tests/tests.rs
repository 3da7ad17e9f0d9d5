use std::fs;
use std::path::PathBuf;

use dsv::{Reader, ReaderBuilder, Row, StringRow};

fn write_file(dir: &tempfile::TempDir, name: &str, data: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn reads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "people.csv", "name,age\nAlice,30\nBob,25\n");

    let mut rdr = Reader::from_path(&path);
    assert_eq!(rdr.headers().unwrap(), &vec!["name", "age"]);
    assert_eq!(rdr.next_row().unwrap(), vec!["Alice", "30"]);
    assert_eq!(rdr.next_row().unwrap(), vec!["Bob", "25"]);
    assert_eq!(rdr.next_row(), None);
    assert_eq!(rdr.line_no(), 3);
    assert_eq!(rdr.path(), Some(path.as_path()));
}

// Building a reader must not touch the file system: a file created after
// the reader, but before the first read, is read normally.
#[test]
fn file_is_opened_on_first_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.csv");

    let mut rdr = ReaderBuilder::new().has_headers(false).from_path(&path);
    fs::write(&path, "a,b\n").unwrap();

    assert_eq!(rdr.next_row().unwrap(), vec!["a", "b"]);
    assert_eq!(rdr.next_row(), None);
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.csv");

    let mut rdr = Reader::from_path(&path);
    assert_eq!(rdr.headers(), None);
    assert_eq!(rdr.next_row(), None);
    // The reader stays drainable after the failed open.
    assert_eq!(rdr.next_row(), None);
    assert_eq!(rdr.headers(), None);
    assert_eq!(rdr.line_no(), 0);
}

#[test]
fn rows_outlive_their_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "rows.csv", "h\none\ntwo\n");

    let mut rdr = Reader::from_path(&path);
    let rows: Vec<Row> = rdr.rows().collect();
    drop(rdr);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["one"]);
    assert_eq!(rows[1], vec!["two"]);
}

#[test]
fn line_no_counts_every_physical_line() {
    let dir = tempfile::tempdir().unwrap();
    let data = "# header comment\n\nk,v\na,1\n\n# tail\nb,2\n";
    let path = write_file(&dir, "counted.csv", data);

    let mut rdr = Reader::from_path(&path);
    while rdr.next_row().is_some() {}
    assert_eq!(rdr.line_no() as usize, data.lines().count());
}

#[test]
fn semicolon_delimited_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "semi.csv", "k;v\nx;1,5\n");

    let mut rdr = ReaderBuilder::new().delimiter(b";").from_path(&path);
    assert_eq!(rdr.headers().unwrap(), &vec!["k", "v"]);
    assert_eq!(rdr.next_row().unwrap(), vec!["x", "1,5"]);
}

// Every non-skippable line yields at least one field.
#[test]
fn rows_never_have_zero_fields() {
    for line in ["x", ",", "\"\"", "a,b", "  x", "\"", "a####"] {
        let data = format!("{}\n", line);
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data.as_bytes());
        let row = rdr.next_row().unwrap();
        assert!(row.len() >= 1, "line {:?} produced {:?}", line, row);
    }
}

// On quote-free lines the tokenizer agrees with a plain split on the
// delimiter byte.
#[test]
fn unquoted_lines_match_plain_split() {
    for line in ["a,b,c", "a,,b", ",x,", "one", "a b,c d", ",,,"] {
        let expected: Vec<&str> = line.split(',').collect();
        let data = format!("{}\n", line);
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data.as_bytes());
        let row = rdr.next_row().unwrap();
        assert_eq!(row, expected, "line {:?}", line);
    }
}

// Joining a row's fields with the delimiter and re-tokenizing yields the
// same fields, as long as no field contains a quote, delimiter or
// terminator.
#[test]
fn join_and_reparse_round_trips() {
    let samples: Vec<Vec<&str>> = vec![
        vec!["a", "b", "c"],
        vec!["", "", ""],
        vec!["one"],
        vec!["x y", "z\t", " lead"],
    ];
    for fields in samples {
        let data = format!("{}\n", fields.join(","));
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data.as_bytes());
        let row = rdr.next_row().unwrap();
        assert_eq!(row, fields, "joined {:?}", data);
    }
}

#[test]
fn string_rows_from_parsed_data() {
    let mut rdr = Reader::from_reader(&b"name,temp\nreactor,293\n"[..]);
    let row = rdr.next_row().unwrap();
    let row = StringRow::from_row(row).unwrap();
    assert_eq!(row, vec!["reactor", "293"]);
    assert_eq!(row.get(0), Some("reactor"));
}

#[test]
fn invalid_utf8_reports_field_index() {
    let mut rdr =
        ReaderBuilder::new().has_headers(false).from_reader(&b"ok,\xFFbad\n"[..]);
    let row = rdr.next_row().unwrap();
    assert_eq!(row.len(), 2);

    let err = StringRow::from_row(row).unwrap_err();
    assert_eq!(err.utf8_error().field(), 1);
    assert_eq!(err.utf8_error().valid_up_to(), 0);
    // The raw bytes are still accessible through the error.
    assert_eq!(err.into_row().get(1), Some(&b"\xFFbad"[..]));
}

#[cfg(feature = "serde")]
#[test]
fn serialize_string_row() {
    let mut rdr = Reader::from_reader(&b"h\na,\"b,c\"\n"[..]);
    let row = StringRow::from_row(rdr.next_row().unwrap()).unwrap();
    let value = serde_json::to_value(&row).unwrap();
    assert_eq!(value, serde_json::json!(["a", "b,c"]));
}

#[cfg(feature = "serde")]
#[test]
fn serialize_row_with_mixed_encodings() {
    let mut row = Row::new();
    row.push_field(b"ok");
    row.push_field(b"\xFF");
    let value = serde_json::to_value(&row).unwrap();
    assert_eq!(value, serde_json::json!(["ok", [255]]));
}
