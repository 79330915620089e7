//! `literal` renders loaded cells as BigQuery literals.
//!
//! `render` is the only place that decides how a value is quoted, and `quote` is the only
//! place that escapes.  Every (column type, cell) combination is matched explicitly, so adding
//! a `ScalarType` variant does not compile until its rendering is chosen here.

use crate::cell::Cell;
use crate::column_type::{ColumnType, ScalarType};

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("Value {text:?} is not a valid {column_type} literal.")]
    InvalidValue {
        text: String,
        column_type: ColumnType,
    },
    #[error("An array value cannot be stored in a {0} column.")]
    ArrayInScalarColumn(ColumnType),
}

/// Renders one cell as the literal text that goes between the parentheses of a row.
pub fn render(column_type: &ColumnType, cell: &Cell) -> Result<String, Error> {
    match (column_type, cell) {
        (_, Cell::Null) => Ok(String::from("NULL")),
        (ColumnType::Scalar(s), Cell::Text(text)) => render_scalar(*s, text),
        (ColumnType::Scalar(ScalarType::String), Cell::Array(items)) => Ok(quote(&json_text(items))),
        (ColumnType::Scalar(_), Cell::Array(_)) => Err(Error::ArrayInScalarColumn(*column_type)),
        (ColumnType::Array(_), Cell::Array(items)) => Ok(quote(&json_text(items))),
        (ColumnType::Array(_), Cell::Text(text)) => {
            let items = parse_json_array(text).ok_or_else(|| invalid(text, column_type))?;
            Ok(quote(&json_text(&items)))
        }
    }
}

fn render_scalar(scalar: ScalarType, text: &str) -> Result<String, Error> {
    let column_type = ColumnType::Scalar(scalar);
    match scalar {
        ScalarType::String
        | ScalarType::Timestamp
        | ScalarType::Date
        | ScalarType::Datetime
        | ScalarType::Time => Ok(quote(text)),
        ScalarType::Int64 => text
            .trim()
            .parse::<i64>()
            .map(|i| i.to_string())
            .map_err(|_| invalid(text, &column_type)),
        ScalarType::Float64 => match text.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(String::from(text.trim())),
            _ => Err(invalid(text, &column_type)),
        },
        ScalarType::Numeric => match text.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(format!("NUMERIC {}", quote(text.trim()))),
            _ => Err(invalid(text, &column_type)),
        },
        ScalarType::Bool => match text.trim().to_lowercase().as_str() {
            "true" => Ok(String::from("true")),
            "false" => Ok(String::from("false")),
            _ => Err(invalid(text, &column_type)),
        },
    }
}

fn invalid(text: &str, column_type: &ColumnType) -> Error {
    Error::InvalidValue {
        text: String::from(text),
        column_type: *column_type,
    }
}

/// Wraps `text` in double quotes, escaping backslashes, double quotes and line breaks.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Compact JSON text of a list of strings, e.g. `["a","b"]`.
fn json_text(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

fn parse_json_array(text: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(items)) => {
            Some(items.into_iter().map(crate::cell::element_text).collect())
        }
        _ => None,
    }
}

#[cfg(test)]
fn scalar(s: ScalarType) -> ColumnType {
    ColumnType::Scalar(s)
}

#[test]
fn test_quote() {
    assert_eq!(quote("abc"), r#""abc""#);
    assert_eq!(quote(r#""xxx""#), r#""\"xxx\"""#);
    assert_eq!(quote(r"a\b"), r#""a\\b""#);
    assert_eq!(quote("line1\nline2"), r#""line1\nline2""#);
    assert_eq!(quote("ほげほげ"), "\"ほげほげ\"");
}

#[test]
fn test_render_quoted_scalars() {
    let cell = Cell::from("2024-01-02");
    for s in [
        ScalarType::String,
        ScalarType::Date,
        ScalarType::Datetime,
        ScalarType::Timestamp,
        ScalarType::Time,
    ] {
        assert_eq!(render(&scalar(s), &cell).unwrap(), r#""2024-01-02""#);
    }
}

#[test]
fn test_render_numbers() {
    let int64 = scalar(ScalarType::Int64);
    assert_eq!(render(&int64, &Cell::from("300")).unwrap(), "300");
    assert_eq!(render(&int64, &Cell::from(" -7 ")).unwrap(), "-7");
    assert_eq!(
        render(&int64, &Cell::from("3.5")),
        Err(Error::InvalidValue {
            text: String::from("3.5"),
            column_type: int64
        })
    );
    assert!(render(&int64, &Cell::from("1); DROP TABLE t; --")).is_err());

    let float64 = scalar(ScalarType::Float64);
    assert_eq!(render(&float64, &Cell::from("1.25")).unwrap(), "1.25");
    assert_eq!(render(&float64, &Cell::from("1e3")).unwrap(), "1e3");
    assert!(render(&float64, &Cell::from("NaN")).is_err());
    assert!(render(&float64, &Cell::from("abc")).is_err());

    let numeric = scalar(ScalarType::Numeric);
    assert_eq!(
        render(&numeric, &Cell::from("12.50")).unwrap(),
        r#"NUMERIC "12.50""#
    );
}

#[test]
fn test_render_bool() {
    let b = scalar(ScalarType::Bool);
    assert_eq!(render(&b, &Cell::from("TRUE")).unwrap(), "true");
    assert_eq!(render(&b, &Cell::from("false")).unwrap(), "false");
    assert!(render(&b, &Cell::from("yes")).is_err());
}

#[test]
fn test_render_null() {
    for t in [
        scalar(ScalarType::String),
        scalar(ScalarType::Int64),
        ColumnType::Array(ScalarType::String),
    ] {
        assert_eq!(render(&t, &Cell::Null).unwrap(), "NULL");
    }
}

#[test]
fn test_render_arrays() {
    let ys = Cell::Array(vec![String::from("y"); 3]);
    let expected = r#""[\"y\",\"y\",\"y\"]""#;
    assert_eq!(render(&ColumnType::Array(ScalarType::String), &ys).unwrap(), expected);
    // An array in a STRING column becomes its JSON text.
    assert_eq!(render(&scalar(ScalarType::String), &ys).unwrap(), expected);
    assert_eq!(
        render(&scalar(ScalarType::Int64), &ys),
        Err(Error::ArrayInScalarColumn(scalar(ScalarType::Int64)))
    );
    // CSV files carry arrays as JSON text.
    assert_eq!(
        render(&ColumnType::Array(ScalarType::Int64), &Cell::from("[1, 2]")).unwrap(),
        r#""[\"1\",\"2\"]""#
    );
    assert!(render(&ColumnType::Array(ScalarType::Int64), &Cell::from("1, 2")).is_err());
}

#[test]
fn test_render_array_elements_with_quotes() {
    let cell = Cell::Array(vec![String::from(r#"say "hi""#)]);
    assert_eq!(
        render(&ColumnType::Array(ScalarType::String), &cell).unwrap(),
        r#""[\"say \\\"hi\\\"\"]""#
    );
}
