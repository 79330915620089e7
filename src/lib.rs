//! Renders CSV and JSON fixture files as inline BigQuery tables, so that SQL logic can be
//! tested without querying a warehouse.
//!
//! Each fixture becomes a `WITH` clause entry whose rows are a literal array of structs:
//!
//! ```text
//! WITH TEST_DATA AS (
//! SELECT * FROM UNNEST(ARRAY<STRUCT<name STRING, value INT64>>
//! [("abc",200),("def",300)]
//! )
//! )
//! ```
//!
//! The clause is prepended to the query under test, which then reads `TEST_DATA` like a table.

pub mod cell;
pub mod column_type;
pub mod literal;
pub mod loader;
pub mod manifest;
pub mod parser;
pub mod schema;
pub mod table;
pub mod temporary_tables;

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub use column_type::{ColumnType, ScalarType};
pub use manifest::Manifest;
pub use schema::{ColumnMeta, Schema};
pub use table::Table;
pub use temporary_tables::TemporaryTables;
