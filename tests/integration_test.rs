use std::env;
use std::io::Write;

use querytest::{Manifest, Table, TemporaryTables};

fn path_to_testdata(filename: &str) -> String {
    env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set")
        + "/resources/test/"
        + filename
}

const COLUMNS: [(&str, &str); 3] = [("name", "STRING"), ("category", "STRING"), ("value", "INT64")];

fn fixture_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Should have created a temp file.");
    f.write_all(contents.as_bytes())
        .expect("Should have written the temp file.");
    f
}

#[test]
fn test_table_to_sql_from_csv() -> anyhow::Result<()> {
    let t = Table::new(path_to_testdata("test1.csv"), &COLUMNS, Some("TEST_DATA"))?;
    assert_eq!(
        t.to_sql(),
        "TEST_DATA AS (\n\
         SELECT * FROM UNNEST(ARRAY<STRUCT<name STRING, category STRING, value INT64>>\n\
         [(\"abc\",\"bdc\",200),(\"ほげほげ\",\"ふがふが\",300000)]\n\
         )\n\
         )"
    );
    Ok(())
}

#[test]
fn test_temporary_tables_from_csv_and_json() -> anyhow::Result<()> {
    let tt = TemporaryTables::new(vec![
        (path_to_testdata("test2.json"), COLUMNS, "TEST_DATA1"),
        (path_to_testdata("test1.csv"), COLUMNS, "TEST_DATA2"),
    ])?;
    let sql = tt.to_sql();
    assert!(sql.starts_with("WITH TEST_DATA1 AS (\n"));
    assert!(sql.contains("\n),TEST_DATA2 AS (\n"));
    assert_eq!(sql.matches("WITH ").count(), 1);
    assert!(!sql.ends_with(','));
    assert_eq!(sql, tt.to_sql());
    Ok(())
}

#[test]
fn test_manifest_matches_direct_construction() -> anyhow::Result<()> {
    let from_manifest = Manifest::load(path_to_testdata("fixtures.toml"))?.into_temporary_tables()?;
    let direct = TemporaryTables::new(vec![
        (path_to_testdata("test2.json"), COLUMNS, "TEST_DATA1"),
        (path_to_testdata("test1.csv"), COLUMNS, "TEST_DATA2"),
    ])?;
    assert_eq!(from_manifest.to_sql(), direct.to_sql());
    Ok(())
}

#[test]
fn test_array_column_from_json_lines() -> anyhow::Result<()> {
    let f = fixture_file(
        ".jsonl",
        "{\"id\": 1, \"tags\": [\"a\", \"b\"], \"ok\": true}\n{\"id\": 2, \"tags\": null, \"ok\": false}\n",
    );
    let columns = [("id", "INT64"), ("tags", "ARRAY<STRING>"), ("ok", "BOOL")];
    let t = Table::new(f.path(), &columns, Some("TAGS"))?;
    assert_eq!(
        t.to_sql(),
        "TAGS AS (\n\
         SELECT * FROM UNNEST(ARRAY<STRUCT<id INT64, tags ARRAY<STRING>, ok BOOL>>\n\
         [(1,\"[\\\"a\\\",\\\"b\\\"]\",true),(2,NULL,false)]\n\
         )\n\
         )"
    );
    Ok(())
}

#[test]
fn test_headerless_csv() -> anyhow::Result<()> {
    let f = fixture_file(".csv", "abc,bdc,200\n");
    let t = Table::new(f.path(), &COLUMNS, Some("T"))?;
    assert_eq!(t.to_string_list(), &[vec!["\"abc\"", "\"bdc\"", "200"]]);
    Ok(())
}

#[test]
fn test_shape_mismatch_is_reported() {
    let f = fixture_file(".csv", "name,category,value\nabc,bdc,200\nabc,bdc\n");
    let err = Table::new(f.path(), &COLUMNS, Some("T")).unwrap_err();
    match err {
        querytest::table::Error::Load {
            detail: querytest::loader::Error::ShapeMismatch { row, expected, found },
            ..
        } => assert_eq!((row, expected, found), (2, 3, 2)),
        other => panic!("Expected shape mismatch, got {:?}", other),
    }
}

#[test]
fn test_unsupported_extension() {
    let f = fixture_file(".xlsx", "");
    assert!(matches!(
        Table::new(f.path(), &COLUMNS, Some("T")),
        Err(querytest::table::Error::Load {
            detail: querytest::loader::Error::UnsupportedFormat(_),
            ..
        })
    ));
}

#[test]
fn test_nested_arrays_are_rejected() {
    let err = Table::new(
        path_to_testdata("test1.csv"),
        &[("name", "ARRAY<ARRAY<STRING>>")],
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Arrays of arrays are not supported"));
}
