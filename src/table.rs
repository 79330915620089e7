//! represents one fixture file bound to a schema, rendered as a `WITH` clause entry.
//!
//! The file is read and every cell rendered as a literal when the `Table` is built.  After that
//! a `Table` is immutable, and rendering SQL from it cannot fail.

use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::literal;
use crate::loader;
use crate::schema::{self, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    path: PathBuf,
    schema: Schema,
    alias: String,
    literals: Vec<Vec<String>>,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid schema: {0}")]
    Schema(#[from] schema::Error),
    #[error("Invalid table alias {alias:?}: {detail}")]
    InvalidAlias {
        alias: String,
        #[source]
        detail: schema::Error,
    },
    #[error("Unable to load {path}: {detail}")]
    Load {
        path: PathBuf,
        #[source]
        detail: loader::Error,
    },
    #[error("Row {row}, column {column}: {detail}")]
    Literal {
        row: usize,
        column: String,
        #[source]
        detail: literal::Error,
    },
}

impl Table {
    /// Loads `path` with columns declared as `(name, type)` pairs.
    /// Without an `alias`, the table is named after the file stem.
    pub fn new<P: AsRef<Path>, N: AsRef<str>, T: AsRef<str>>(
        path: P,
        columns: &[(N, T)],
        alias: Option<&str>,
    ) -> Result<Table, Error> {
        let schema = Schema::new(columns)?;
        Table::with_schema(path, schema, alias)
    }

    pub fn with_schema<P: AsRef<Path>>(
        path: P,
        schema: Schema,
        alias: Option<&str>,
    ) -> Result<Table, Error> {
        let path = path.as_ref().to_path_buf();
        let alias = match alias {
            Some(a) => String::from(a),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        schema::validate_name(&alias).map_err(|detail| Error::InvalidAlias {
            alias: alias.clone(),
            detail,
        })?;

        let rows = loader::load(&path, &schema.column_names()).map_err(|detail| Error::Load {
            path: path.clone(),
            detail,
        })?;
        let literals = rows
            .iter()
            .enumerate()
            .map(|(rownum, row)| {
                schema
                    .columns()
                    .iter()
                    .zip(row.items.iter())
                    .map(|(column, cell)| {
                        literal::render(&column.column_type(), cell).map_err(|detail| {
                            Error::Literal {
                                row: rownum + 1,
                                column: String::from(column.name()),
                                detail,
                            }
                        })
                    })
                    .collect::<Result<Vec<String>, Error>>()
            })
            .collect::<Result<Vec<Vec<String>>, Error>>()?;
        tracing::debug!(%alias, columns = schema.len(), rows = literals.len(), "built table");
        Ok(Table {
            path,
            schema,
            alias,
            literals,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns every cell rendered as a literal, one inner `Vec` per row.
    /// Strings are already quoted and escaped; numbers are bare.
    pub fn to_string_list(&self) -> &[Vec<String>] {
        &self.literals
    }

    /// Joins rendered rows as `[(a,b),(c,d)]`.  Cells are used as given.
    pub fn sql_string<R: AsRef<[S]>, S: AsRef<str>>(rows: &[R]) -> String {
        format!(
            "[{}]",
            rows.iter()
                .map(|row| format!("({})", row.as_ref().iter().map(|c| c.as_ref()).join(",")))
                .join(",")
        )
    }

    pub fn to_sql(&self) -> String {
        format!(
            "{} AS (\nSELECT * FROM UNNEST(ARRAY<{}>\n{}\n)\n)",
            self.alias,
            self.schema,
            Table::sql_string(&self.literals)
        )
    }
}

#[cfg(test)]
fn path_to_testdata(filename: &str) -> String {
    std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set")
        + "/resources/test/"
        + filename
}

#[cfg(test)]
const TEST_COLUMNS: [(&str, &str); 3] = [("name", "STRING"), ("category", "STRING"), ("value", "INT64")];

#[test]
fn test_table() {
    let t = Table::new(path_to_testdata("test1.csv"), &TEST_COLUMNS, None).unwrap();
    assert_eq!(t.alias(), "test1");
    assert_eq!(t.schema().len(), 3);
    assert_eq!(t.to_string_list().len(), 2);
    assert!(t.to_string_list().iter().all(|row| row.len() == 3));
}

#[test]
fn test_to_sql() {
    let t = Table::new(path_to_testdata("test1.csv"), &TEST_COLUMNS, Some("TEST_DATA")).unwrap();
    assert_eq!(
        t.to_sql(),
        r#"TEST_DATA AS (
SELECT * FROM UNNEST(ARRAY<STRUCT<name STRING, category STRING, value INT64>>
[("abc","bdc",200),("ほげほげ","ふがふが",300000)]
)
)"#
    );
    assert_eq!(t.to_sql(), t.to_sql());
}

#[test]
fn test_to_string_list() {
    let t = Table::new(path_to_testdata("test2.json"), &TEST_COLUMNS, Some("TEST_DATA")).unwrap();
    assert_eq!(
        t.to_string_list(),
        &[
            vec![r#""abc""#, r#""bcd""#, "300"],
            vec![r#""ddd""#, r#""ccc""#, "400"],
            vec![r#""\"xxx\"""#, r#""yyy""#, "123"],
            vec![r#""\"xxx\"""#, r#""[\"y\",\"y\",\"y\"]""#, "123"],
        ]
    );
}

#[test]
fn test_sql_string() {
    let rows = vec![
        vec![r#""abc""#, r#""bcd""#, "300"],
        vec![r#""ddd""#, r#""ccc""#, "400"],
        vec![r#""\"xxx\"""#, r#""yyy""#, "123"],
    ];
    assert_eq!(
        Table::sql_string(&rows),
        r#"[("abc","bcd",300),("ddd","ccc",400),("\"xxx\"","yyy",123)]"#
    );
    let empty: Vec<Vec<String>> = vec![];
    assert_eq!(Table::sql_string(&empty), "[]");
}

#[test]
fn test_invalid_alias() {
    let r = Table::new(path_to_testdata("test1.csv"), &TEST_COLUMNS, Some("TEST DATA"));
    assert!(matches!(r, Err(Error::InvalidAlias { .. })));
}

#[test]
fn test_invalid_schema() {
    let r = Table::new(path_to_testdata("test1.csv"), &[("name", "INTEGER")], None);
    assert!(matches!(r, Err(Error::Schema(_))));
}

#[test]
fn test_value_not_matching_type() {
    // `category` holds text, which is not an INT64.
    let columns = [("name", "STRING"), ("category", "INT64"), ("value", "INT64")];
    match Table::new(path_to_testdata("test1.csv"), &columns, None) {
        Err(Error::Literal { row, column, .. }) => {
            assert_eq!(row, 1);
            assert_eq!(column, "category");
        }
        other => panic!("Expected literal error, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let r = Table::new(path_to_testdata("missing.csv"), &TEST_COLUMNS, None);
    assert!(matches!(
        r,
        Err(Error::Load {
            detail: loader::Error::Open { .. },
            ..
        })
    ));
}
