//! `loader` reads fixture files into rows of cells, ordered like the schema's columns.
//!
//! CSV and JSON parsing are left to the `csv` and `serde_json` crates.  This module only decides
//! how the parsed records map onto the declared columns:
//!   - CSV: if the first record contains every column name it is a header, and columns are picked
//!     by name.  Otherwise all records are data and columns are taken by position.
//!   - JSON: an array whose elements are objects (picked by key) or arrays (taken by position).
//!   - JSON Lines: one such element per line.
//!
//! Any record that does not fit the declared width is an error, never truncated or padded.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cell::{Cell, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    JsonLines,
}

impl Format {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Format, Error> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(Format::Csv),
            Some("json") => Ok(Format::Json),
            Some("jsonl") | Some("ndjson") => Ok(Format::JsonLines),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unsupported fixture format for {0}: expected .csv, .json, .jsonl or .ndjson.")]
    UnsupportedFormat(PathBuf),
    #[error("Error opening {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error reading fixture: {0}")]
    Read(#[from] std::io::Error),
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON fixtures must hold objects or arrays, found {0}.")]
    UnsupportedJsonLayout(&'static str),
    #[error("Row {row} has {found} columns, expected {expected}.")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Loads the file at `path`.  The file is closed before this returns.
pub fn load(path: &Path, column_names: &[&str]) -> Result<Vec<Row>, Error> {
    let format = Format::from_path(path)?;
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read(format, file, column_names)?;
    tracing::debug!(path = %path.display(), ?format, rows = rows.len(), "loaded fixture");
    Ok(rows)
}

/// Reads fixture data in `format` from any reader.
pub fn read<R: Read>(format: Format, reader: R, column_names: &[&str]) -> Result<Vec<Row>, Error> {
    match format {
        Format::Csv => read_csv(reader, column_names),
        Format::Json => read_json(BufReader::new(reader), column_names),
        Format::JsonLines => read_json_lines(BufReader::new(reader), column_names),
    }
}

fn read_csv<R: Read>(reader: R, column_names: &[&str]) -> Result<Vec<Row>, Error> {
    // Record lengths are checked below, so that a short row reports its row number.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = rdr.records();
    let first = match records.next() {
        Some(first) => first?,
        None => return Ok(vec![]),
    };
    let header = header_positions(&first, column_names);
    let (positions, width) = match &header {
        Some(positions) => (positions.clone(), first.len()),
        None => ((0..column_names.len()).collect::<Vec<usize>>(), column_names.len()),
    };
    let rows: Result<Vec<Row>, Error> = std::iter::once(Ok(first))
        .filter(|_| header.is_none())
        .chain(records)
        .enumerate()
        .map(|(i, record)| {
            let record = record?;
            if record.len() != width {
                return Err(Error::ShapeMismatch {
                    row: i + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            Ok(Row {
                items: positions.iter().map(|&p| csv_cell(&record[p])).collect(),
            })
        })
        .collect();
    rows
}

/// Returns the index of each column in `record`, if `record` is a header naming all of them.
fn header_positions(record: &csv::StringRecord, column_names: &[&str]) -> Option<Vec<usize>> {
    column_names
        .iter()
        .map(|name| record.iter().position(|field| field.trim() == *name))
        .collect()
}

fn csv_cell(field: &str) -> Cell {
    match field {
        "" => Cell::Null,
        text => Cell::from(text),
    }
}

fn read_json<R: Read>(reader: R, column_names: &[&str]) -> Result<Vec<Row>, Error> {
    let document: Value = serde_json::from_reader(reader)?;
    match document {
        Value::Array(elements) => elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| json_row(element, i + 1, column_names))
            .collect(),
        other => Err(Error::UnsupportedJsonLayout(json_kind(&other))),
    }
}

fn read_json_lines<R: BufRead>(reader: R, column_names: &[&str]) -> Result<Vec<Row>, Error> {
    let mut rows = vec![];
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let element: Value = serde_json::from_str(&line)?;
        rows.push(json_row(element, rows.len() + 1, column_names)?);
    }
    Ok(rows)
}

fn json_row(element: Value, row: usize, column_names: &[&str]) -> Result<Row, Error> {
    match element {
        // Missing keys load as NULL; keys not in the schema are ignored.
        Value::Object(fields) => Ok(Row {
            items: column_names
                .iter()
                .map(|name| fields.get(*name).cloned().map_or(Cell::Null, Cell::from))
                .collect(),
        }),
        Value::Array(items) if items.len() == column_names.len() => Ok(Row {
            items: items.into_iter().map(Cell::from).collect(),
        }),
        Value::Array(items) => Err(Error::ShapeMismatch {
            row,
            expected: column_names.len(),
            found: items.len(),
        }),
        other => Err(Error::UnsupportedJsonLayout(json_kind(&other))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
fn texts(row: &Row) -> Vec<String> {
    row.items.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_format_from_path() {
    assert_eq!(Format::from_path(Path::new("a/b.csv")).unwrap(), Format::Csv);
    assert_eq!(Format::from_path(Path::new("b.JSON")).unwrap(), Format::Json);
    assert_eq!(Format::from_path(Path::new("b.jsonl")).unwrap(), Format::JsonLines);
    assert_eq!(Format::from_path(Path::new("b.ndjson")).unwrap(), Format::JsonLines);
    assert!(matches!(
        Format::from_path(Path::new("b.parquet")),
        Err(Error::UnsupportedFormat(_))
    ));
    assert!(Format::from_path(Path::new("noext")).is_err());
}

#[test]
fn test_read_csv_with_header_picks_columns_by_name() {
    let data = "value,name,extra\n200,abc,x\n300,def,y\n";
    let rows = read(Format::Csv, data.as_bytes(), &["name", "value"]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(texts(&rows[0]), vec!["abc", "200"]);
    assert_eq!(texts(&rows[1]), vec!["def", "300"]);
}

#[test]
fn test_read_csv_without_header_is_positional() {
    let data = "abc,200\n\"quoted, comma\",300\n";
    let rows = read(Format::Csv, data.as_bytes(), &["name", "value"]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(texts(&rows[1]), vec!["quoted, comma", "300"]);
}

#[test]
fn test_read_csv_empty_field_is_null() {
    let rows = read(Format::Csv, "name,value\nabc,\n".as_bytes(), &["name", "value"]).unwrap();
    assert_eq!(rows[0].items, vec![Cell::from("abc"), Cell::Null]);
}

#[test]
fn test_read_csv_shape_mismatch() {
    let data = "name,value\nabc,1\ndef\n";
    match read(Format::Csv, data.as_bytes(), &["name", "value"]) {
        Err(Error::ShapeMismatch {
            row,
            expected,
            found,
        }) => assert_eq!((row, expected, found), (2, 2, 1)),
        other => panic!("Expected shape mismatch, got {:?}", other),
    }
    // Without a header, the schema fixes the width.
    assert!(matches!(
        read(Format::Csv, "a,b,c\n".as_bytes(), &["x", "y"]),
        Err(Error::ShapeMismatch { row: 1, expected: 2, found: 3 })
    ));
}

#[test]
fn test_read_csv_empty_input() {
    assert!(read(Format::Csv, "".as_bytes(), &["name"]).unwrap().is_empty());
}

#[test]
fn test_read_json_objects() {
    let data = r#"[{"name": "abc", "value": 300, "extra": 1}, {"value": 400}]"#;
    let rows = read(Format::Json, data.as_bytes(), &["name", "value"]).unwrap();
    assert_eq!(rows[0].items, vec![Cell::from("abc"), Cell::from("300")]);
    assert_eq!(rows[1].items, vec![Cell::Null, Cell::from("400")]);
}

#[test]
fn test_read_json_arrays() {
    let data = r#"[["abc", ["y", "y"]], ["def", null]]"#;
    let rows = read(Format::Json, data.as_bytes(), &["name", "tags"]).unwrap();
    assert_eq!(
        rows[0].items,
        vec![
            Cell::from("abc"),
            Cell::Array(vec![String::from("y"), String::from("y")])
        ]
    );
    assert_eq!(rows[1].items, vec![Cell::from("def"), Cell::Null]);
    assert!(matches!(
        read(Format::Json, r#"[["abc"]]"#.as_bytes(), &["name", "tags"]),
        Err(Error::ShapeMismatch { row: 1, expected: 2, found: 1 })
    ));
}

#[test]
fn test_read_json_rejects_other_layouts() {
    assert!(matches!(
        read(Format::Json, r#"{"name": "abc"}"#.as_bytes(), &["name"]),
        Err(Error::UnsupportedJsonLayout("an object"))
    ));
    assert!(matches!(
        read(Format::Json, r#"[1, 2]"#.as_bytes(), &["name"]),
        Err(Error::UnsupportedJsonLayout("a number"))
    ));
    assert!(matches!(
        read(Format::Json, "[{".as_bytes(), &["name"]),
        Err(Error::Json(_))
    ));
}

#[test]
fn test_read_json_lines() {
    let data = "{\"name\": \"abc\"}\n\n[\"def\"]\n";
    let rows = read(Format::JsonLines, data.as_bytes(), &["name"]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(texts(&rows[1]), vec!["def"]);
}

#[test]
fn test_load_missing_file() {
    assert!(matches!(
        load(Path::new("/nonexistent/fixture.csv"), &["name"]),
        Err(Error::Open { .. })
    ));
}
