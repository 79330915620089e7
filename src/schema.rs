//! `schema` holds validated column declarations and renders them as BigQuery type text.

use itertools::Itertools;
use std::str::FromStr;

use crate::column_type::{self, ColumnType};
use crate::parser::{self, Rule};

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("Name must not be empty.")]
    EmptyName,
    #[error("Name {0:?} must not contain whitespace or commas.")]
    InvalidName(String),
    #[error("Invalid type for column {name}: {detail}")]
    InvalidColumnType {
        name: String,
        #[source]
        detail: column_type::Error,
    },
    #[error("A schema needs at least one column.")]
    EmptySchema,
    #[error("Unable to parse column declaration: {0:?}.")]
    Malformed(String),
}

/// Checks that `name` can be embedded in SQL type text, where spaces and commas separate
/// declarations.  Used for column names and for table aliases.
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::EmptyName);
    }
    match parser::parse_decl(Rule::column_name_decl, name) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::InvalidName(String::from(name))),
    }
}

/// One `(name, type)` declaration.  Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    name: String,
    column_type: ColumnType,
}

impl ColumnMeta {
    pub fn new(name: &str, column_type: &str) -> Result<ColumnMeta, Error> {
        validate_name(name)?;
        let column_type =
            ColumnType::from_str(column_type).map_err(|detail| Error::InvalidColumnType {
                name: String::from(name),
                detail,
            })?;
        Ok(ColumnMeta {
            name: String::from(name),
            column_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

impl std::fmt::Display for ColumnMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)
    }
}

/// Parses the rendered form, `name TYPE`.
impl FromStr for ColumnMeta {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pair = parser::parse_decl(Rule::column_def_decl, s)
            .map_err(|_| Error::Malformed(String::from(s)))?;
        column_meta_from_pair(pair)
    }
}

fn column_meta_from_pair(pair: pest::iterators::Pair<'_, Rule>) -> Result<ColumnMeta, Error> {
    let (name_pair, type_pair) = match pair.into_inner().collect_tuple() {
        Some(parts) => parts,
        None => unreachable!("column_def has a name and a type"),
    };
    let name = String::from(name_pair.as_str());
    let column_type =
        column_type::from_pair(type_pair).map_err(|detail| Error::InvalidColumnType {
            name: name.clone(),
            detail,
        })?;
    Ok(ColumnMeta { name, column_type })
}

/// An ordered, non-empty list of columns.  The order fixes the position of each value in
/// the rendered rows.
///
/// Duplicate names are allowed, but lookups by name (such as picking CSV columns by header)
/// only ever find the first of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnMeta>,
}

impl Schema {
    pub fn new<N: AsRef<str>, T: AsRef<str>>(pairs: &[(N, T)]) -> Result<Schema, Error> {
        let columns = pairs
            .iter()
            .map(|(name, column_type)| ColumnMeta::new(name.as_ref(), column_type.as_ref()))
            .collect::<Result<Vec<ColumnMeta>, Error>>()?;
        Schema::from_columns(columns)
    }

    pub fn from_columns(columns: Vec<ColumnMeta>) -> Result<Schema, Error> {
        if columns.is_empty() {
            return Err(Error::EmptySchema);
        }
        Ok(Schema { columns })
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnMeta::name).collect()
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(ColumnMeta::column_type).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    // Always false: a schema has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "STRUCT<{}>", self.columns.iter().join(", "))
    }
}

/// Parses the rendered form, `STRUCT<name TYPE, ...>`.
impl FromStr for Schema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pair = parser::parse_decl(Rule::struct_type_decl, s)
            .map_err(|_| Error::Malformed(String::from(s)))?;
        let columns = pair
            .into_inner()
            .map(column_meta_from_pair)
            .collect::<Result<Vec<ColumnMeta>, Error>>()?;
        Schema::from_columns(columns)
    }
}

#[test]
fn test_column_meta_accepts_supported_types() {
    assert!(ColumnMeta::new("name", "STRING").is_ok());
    assert!(ColumnMeta::new("name", "ARRAY<STRING>").is_ok());
    assert!(ColumnMeta::new("created_at", "TIMESTAMP").is_ok());
}

#[test]
fn test_column_meta_display() {
    assert_eq!(
        ColumnMeta::new("name", "STRING").unwrap().to_string(),
        "name STRING"
    );
    assert_eq!(
        ColumnMeta::new("tags", "ARRAY<INT64>").unwrap().to_string(),
        "tags ARRAY<INT64>"
    );
}

#[test]
fn test_column_meta_rejects_bad_names() {
    assert_eq!(ColumnMeta::new("", "ARRAY<STRING>"), Err(Error::EmptyName));
    for name in ["\n", "a b", ",", "a,b", "a\tb"] {
        assert_eq!(
            ColumnMeta::new(name, "STRING"),
            Err(Error::InvalidName(String::from(name)))
        );
    }
}

#[test]
fn test_column_meta_rejects_bad_types() {
    for t in ["INTEGER", "ARRAY", "ARRAY<ARRAY<STRING>>", "string", ""] {
        match ColumnMeta::new("name", t) {
            Err(Error::InvalidColumnType { name, .. }) => assert_eq!(name, "name"),
            other => panic!("Expected type error for {:?}, got {:?}", t, other),
        }
    }
}

#[test]
fn test_column_meta_from_str() {
    let c = ColumnMeta::from_str("tags ARRAY<STRING>").unwrap();
    assert_eq!(c.name(), "tags");
    assert_eq!(
        c.column_type(),
        ColumnType::Array(crate::column_type::ScalarType::String)
    );
    assert!(ColumnMeta::from_str("tags").is_err());
    assert!(matches!(
        ColumnMeta::from_str("id INTEGER"),
        Err(Error::InvalidColumnType { .. })
    ));
}

#[test]
fn test_schema_new() {
    let s = Schema::new(&[("name", "STRING"), ("value", "INT64")]).unwrap();
    assert_eq!(s.len(), 2);
    assert_eq!(s.column_names(), vec!["name", "value"]);
}

#[test]
fn test_schema_rejects_empty() {
    let empty: [(&str, &str); 0] = [];
    assert_eq!(Schema::new(&empty), Err(Error::EmptySchema));
    assert_eq!(Schema::from_columns(vec![]), Err(Error::EmptySchema));
}

#[test]
fn test_schema_propagates_column_errors() {
    assert_eq!(
        Schema::new(&[("name", "STRING"), ("a b", "INT64")]),
        Err(Error::InvalidName(String::from("a b")))
    );
}

#[test]
fn test_schema_display() {
    let s = Schema::new(&[("time", "TIMESTAMP"), ("event", "STRING"), ("id", "INT64")]).unwrap();
    assert_eq!(s.to_string(), "STRUCT<time TIMESTAMP, event STRING, id INT64>");
    let one = Schema::new(&[("tags", "ARRAY<STRING>")]).unwrap();
    assert_eq!(one.to_string(), "STRUCT<tags ARRAY<STRING>>");
}

#[test]
fn test_schema_from_str() {
    let text = "STRUCT<time TIMESTAMP, tags ARRAY<STRING>, id INT64>";
    let s = Schema::from_str(text).unwrap();
    assert_eq!(s.column_names(), vec!["time", "tags", "id"]);
    assert_eq!(s.to_string(), text);
    assert_eq!(
        Schema::from_str("STRUCT<>"),
        Err(Error::Malformed(String::from("STRUCT<>")))
    );
}
