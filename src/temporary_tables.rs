//! Defines `TemporaryTables`, the set of fixture tables that make up one `WITH` clause.

use std::collections::HashSet;
use std::path::Path;

use itertools::Itertools;

use crate::table::{self, Table};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("At least one temporary table is required.")]
    Empty,
    #[error("Table alias {0} is used more than once.")]
    DuplicateAlias(String),
    #[error("Error building table {alias}: {detail}")]
    Table {
        alias: String,
        #[source]
        detail: table::Error,
    },
}

/// A `TemporaryTables` holds the tables, in declaration order, that a query under test reads
/// instead of real warehouse tables.
///
/// Every table has a distinct alias, so that the query can refer to each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryTables {
    tables: Vec<Table>,
}

impl TemporaryTables {
    /// Builds one table per `(path, columns, alias)` triple.
    pub fn new<I, P, C, N, T, A>(triples: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (P, C, A)>,
        P: AsRef<Path>,
        C: AsRef<[(N, T)]>,
        N: AsRef<str>,
        T: AsRef<str>,
        A: AsRef<str>,
    {
        let tables = triples
            .into_iter()
            .map(|(path, columns, alias)| {
                let alias = alias.as_ref();
                Table::new(path, columns.as_ref(), Some(alias)).map_err(|detail| Error::Table {
                    alias: String::from(alias),
                    detail,
                })
            })
            .collect::<Result<Vec<Table>, Error>>()?;
        TemporaryTables::from_tables(tables)
    }

    pub fn from_tables(tables: Vec<Table>) -> Result<Self, Error> {
        if tables.is_empty() {
            return Err(Error::Empty);
        }
        let mut seen = HashSet::new();
        for t in tables.iter() {
            if !seen.insert(t.alias()) {
                return Err(Error::DuplicateAlias(String::from(t.alias())));
            }
        }
        Ok(TemporaryTables { tables })
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, alias: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.alias() == alias)
    }

    /// Renders `WITH a AS (...),b AS (...)`.
    pub fn to_sql(&self) -> String {
        let sql = format!("WITH {}", self.tables.iter().map(Table::to_sql).join(","));
        tracing::trace!(tables = self.tables.len(), bytes = sql.len(), "rendered WITH clause");
        sql
    }

    /// Puts the `WITH` clause in front of `query`, on its own lines.
    pub fn prepend_to(&self, query: &str) -> String {
        format!("{}\n{}", self.to_sql(), query)
    }
}

#[cfg(test)]
fn path_to_testdata(filename: &str) -> String {
    std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set")
        + "/resources/test/"
        + filename
}

#[cfg(test)]
fn test_triples() -> Vec<(String, Vec<(&'static str, &'static str)>, &'static str)> {
    let columns = vec![("name", "STRING"), ("category", "STRING"), ("value", "INT64")];
    vec![
        (path_to_testdata("test2.json"), columns.clone(), "TEST_DATA1"),
        (path_to_testdata("test1.csv"), columns, "TEST_DATA2"),
    ]
}

#[test]
fn test_new() {
    let tt = TemporaryTables::new(test_triples()).unwrap();
    assert_eq!(tt.tables().len(), 2);
    assert_eq!(tt.get("TEST_DATA2").map(|t| t.alias()), Some("TEST_DATA2"));
    assert!(tt.get("TEST_DATA3").is_none());
}

#[test]
fn test_to_sql() {
    let tt = TemporaryTables::new(test_triples()).unwrap();
    assert_eq!(
        tt.to_sql(),
        r#"WITH TEST_DATA1 AS (
SELECT * FROM UNNEST(ARRAY<STRUCT<name STRING, category STRING, value INT64>>
[("abc","bcd",300),("ddd","ccc",400),("\"xxx\"","yyy",123),("\"xxx\"","[\"y\",\"y\",\"y\"]",123)]
)
),TEST_DATA2 AS (
SELECT * FROM UNNEST(ARRAY<STRUCT<name STRING, category STRING, value INT64>>
[("abc","bdc",200),("ほげほげ","ふがふが",300000)]
)
)"#
    );
}

#[test]
fn test_to_sql_joins_tables_in_order() {
    let tt = TemporaryTables::new(test_triples()).unwrap();
    let expected = format!("WITH {},{}", tt.tables()[0].to_sql(), tt.tables()[1].to_sql());
    assert_eq!(tt.to_sql(), expected);
    assert_eq!(tt.to_sql(), tt.to_sql());
}

#[test]
fn test_prepend_to() {
    let tt = TemporaryTables::new(test_triples()).unwrap();
    let q = "SELECT COUNT(*) FROM TEST_DATA1";
    assert_eq!(tt.prepend_to(q), format!("{}\n{}", tt.to_sql(), q));
}

#[test]
fn test_empty() {
    let none: Vec<(String, Vec<(&str, &str)>, &str)> = vec![];
    assert!(matches!(TemporaryTables::new(none), Err(Error::Empty)));
    assert!(matches!(TemporaryTables::from_tables(vec![]), Err(Error::Empty)));
}

#[test]
fn test_duplicate_alias() {
    let mut triples = test_triples();
    triples[1].2 = "TEST_DATA1";
    match TemporaryTables::new(triples) {
        Err(Error::DuplicateAlias(alias)) => assert_eq!(alias, "TEST_DATA1"),
        other => panic!("Expected duplicate alias error, got {:?}", other),
    }
}

#[test]
fn test_table_error_names_alias() {
    let mut triples = test_triples();
    triples[1].1 = vec![("name", "ARRAY<ARRAY<STRING>>")];
    match TemporaryTables::new(triples) {
        Err(Error::Table { alias, .. }) => assert_eq!(alias, "TEST_DATA2"),
        other => panic!("Expected table error, got {:?}", other),
    }
}
