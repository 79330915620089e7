//! Defines the closed set of BigQuery column types that fixtures can declare, and their
//! conversion to and from type tags like `INT64` or `ARRAY<STRING>`.
use enum_as_inner::EnumAsInner;
use pest::iterators::Pair;
use std::str::FromStr;
use thiserror::Error;

use crate::parser::{self, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// These are the scalar types a column (or an array element) can have.
/// Notes:
///   - Tags are matched exactly, in upper case, as BigQuery prints them.
///   - Aliases like `INTEGER` for `INT64` are not accepted.
pub enum ScalarType {
    String,
    Int64,
    Float64,
    Numeric,
    Bool,
    Timestamp,
    Date,
    Datetime,
    Time,
}

impl ScalarType {
    pub const ALL: [ScalarType; 9] = [
        ScalarType::String,
        ScalarType::Int64,
        ScalarType::Float64,
        ScalarType::Numeric,
        ScalarType::Bool,
        ScalarType::Timestamp,
        ScalarType::Date,
        ScalarType::Datetime,
        ScalarType::Time,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ScalarType::String => "STRING",
            ScalarType::Int64 => "INT64",
            ScalarType::Float64 => "FLOAT64",
            ScalarType::Numeric => "NUMERIC",
            ScalarType::Bool => "BOOL",
            ScalarType::Timestamp => "TIMESTAMP",
            ScalarType::Date => "DATE",
            ScalarType::Datetime => "DATETIME",
            ScalarType::Time => "TIME",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.tag().fmt(f)
    }
}

/// The declared type of one column.
///
/// The element type of an array is a `ScalarType`, so `ARRAY<ARRAY<...>>` has no representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumAsInner)]
pub enum ColumnType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Scalar(s) => s.fmt(f),
            ColumnType::Array(s) => write!(f, "ARRAY<{}>", s),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("Unsupported column type: {0}.")]
    Unsupported(String),
    #[error("Malformed column type: {0:?}.")]
    Malformed(String),
    #[error("Arrays of arrays are not supported: {0}.")]
    NestedArray(String),
}

impl FromStr for ScalarType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarType::ALL
            .iter()
            .find(|t| t.tag() == s)
            .copied()
            .ok_or_else(|| Error::Unsupported(String::from(s)))
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pair = parser::parse_decl(Rule::column_type_decl, s)
            .map_err(|_| Error::Malformed(String::from(s)))?;
        from_pair(pair)
    }
}

/// Converts a `column_type` parse tree into a `ColumnType`.
pub(crate) fn from_pair(pair: Pair<'_, Rule>) -> Result<ColumnType, Error> {
    let text = pair.as_str();
    let inner = parser::only_child(pair);
    match inner.as_rule() {
        Rule::scalar_type => Ok(ColumnType::Scalar(inner.as_str().parse()?)),
        Rule::array_type => match from_pair(parser::only_child(inner))? {
            ColumnType::Scalar(element) => Ok(ColumnType::Array(element)),
            ColumnType::Array(_) => Err(Error::NestedArray(String::from(text))),
        },
        rule => unreachable!("column_type expected array_type or scalar_type, found {:?}", rule),
    }
}

#[test]
fn test_parse_scalar_types() {
    for t in ScalarType::ALL {
        let tag = t.to_string();
        assert_eq!(ColumnType::from_str(&tag), Ok(ColumnType::Scalar(t)));
        assert_eq!(ColumnType::from_str(&tag).unwrap().to_string(), tag);
    }
}

#[test]
fn test_parse_array_types() {
    let ct = ColumnType::from_str("ARRAY<STRING>").unwrap();
    assert_eq!(ct, ColumnType::Array(ScalarType::String));
    assert_eq!(ct.as_array(), Some(&ScalarType::String));
    assert_eq!(ct.to_string(), "ARRAY<STRING>");
    assert_eq!(
        ColumnType::from_str("ARRAY<DATE>").unwrap().to_string(),
        "ARRAY<DATE>"
    );
}

#[test]
fn test_reject_unsupported_types() {
    assert_eq!(
        ColumnType::from_str("INTEGER"),
        Err(Error::Unsupported(String::from("INTEGER")))
    );
    // ARRAY needs an element type.
    assert_eq!(
        ColumnType::from_str("ARRAY"),
        Err(Error::Unsupported(String::from("ARRAY")))
    );
    assert_eq!(
        ColumnType::from_str("ARRAY<INTEGER>"),
        Err(Error::Unsupported(String::from("INTEGER")))
    );
    assert_eq!(
        ColumnType::from_str("string"),
        Err(Error::Malformed(String::from("string")))
    );
    assert_eq!(
        ColumnType::from_str("ARRAY<STRUCT<a STRING>>"),
        Err(Error::Malformed(String::from("ARRAY<STRUCT<a STRING>>")))
    );
}

#[test]
fn test_reject_nested_arrays() {
    assert_eq!(
        ColumnType::from_str("ARRAY<ARRAY<STRING>>"),
        Err(Error::NestedArray(String::from("ARRAY<ARRAY<STRING>>")))
    );
    assert_eq!(
        ColumnType::from_str("ARRAY<ARRAY<ARRAY<INT64>>>"),
        Err(Error::NestedArray(String::from("ARRAY<ARRAY<INT64>>")))
    );
}
