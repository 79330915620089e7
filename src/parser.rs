//! `parser` contains the generated parser for column declarations and tests on it.
//!
//! The grammar only decides the shape of the text. Whether a type tag names a supported type
//! is decided by `column_type`, so that the closed set of types lives in one enum.

use pest::iterators::Pair;

#[allow(unused_imports)]
use pest::Parser; // This needs to be in scope for the next statements to work.
#[derive(Parser)]
#[grammar = "schema.pest"]
pub struct SchemaParser;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unable to parse {input:?}: {detail}")]
    Syntax {
        input: String,
        #[source]
        detail: Box<pest::error::Error<Rule>>,
    },
}

/// Parses `input` as one of the `*_decl` rules and returns the declaration's payload,
/// i.e. the single pair between `SOI` and `EOI`.
pub fn parse_decl(rule: Rule, input: &str) -> Result<Pair<'_, Rule>, Error> {
    let decl = SchemaParser::parse(rule, input)
        .map_err(|e| Error::Syntax {
            input: String::from(input),
            detail: Box::new(e),
        })?
        .next();
    match decl {
        Some(decl) => Ok(only_child(decl)),
        None => unreachable!("a successful parse of {:?} yields one pair", rule),
    }
}

/// Returns the first child of a pair whose rule guarantees at least one child.
pub(crate) fn only_child(pair: Pair<'_, Rule>) -> Pair<'_, Rule> {
    let rule = pair.as_rule();
    match pair.into_inner().next() {
        Some(child) => child,
        None => unreachable!("{:?} always has an inner pair", rule),
    }
}

#[test]
fn test_parse_column_names() {
    let cases = vec!["name", "a_b", "Value1", "ほげ", "x.y", "`quoted`"];
    for case in cases {
        assert!(SchemaParser::parse(Rule::column_name_decl, case).is_ok());
    }
}

#[test]
fn test_not_parse_invalid_column_names() {
    let cases = vec!["", "a b", "\n", "a\nb", ",", "a,b", "tab\there", " lead"];
    for case in cases {
        assert!(
            SchemaParser::parse(Rule::column_name_decl, case).is_err(),
            "Case: {:?}",
            case
        );
    }
}

#[test]
fn test_parse_column_types() {
    let cases = vec![
        "STRING",
        "INT64",
        "ARRAY<STRING>",
        "ARRAY<ARRAY<INT64>>", // Shape is fine; rejected later when converting.
        "INTEGER",             // Likewise, only the spelling is checked here.
        "ARRAY",
    ];
    for case in cases {
        println!("Case: {}", case);
        assert!(SchemaParser::parse(Rule::column_type_decl, case).is_ok());
    }
}

#[test]
fn test_not_parse_invalid_column_types() {
    let cases = vec![
        "string",
        "ARRAY<>",
        "ARRAY<STRING",
        "ARRAY< STRING >",
        "ARRAY<STRUCT<a STRING>>",
        "STRING ",
        "",
    ];
    for case in cases {
        assert!(
            SchemaParser::parse(Rule::column_type_decl, case).is_err(),
            "Case: {:?}",
            case
        );
    }
}

#[test]
fn test_parse_struct_types() {
    let cases = vec![
        "STRUCT<name STRING>",
        "STRUCT<time TIMESTAMP, event STRING, id INT64>",
        "STRUCT<tags ARRAY<STRING>, n INT64>",
    ];
    for case in cases {
        match SchemaParser::parse(Rule::struct_type_decl, case) {
            Ok(_) => continue,
            Err(e) => panic!("Error parsing [{}] : {}", case, e),
        }
    }
}

#[test]
fn test_not_parse_invalid_struct_types() {
    let cases = vec![
        "STRUCT<>",
        "STRUCT<name STRING,value INT64>",
        "STRUCT<name  STRING>",
        "struct<name STRING>",
        "name STRING",
    ];
    for case in cases {
        assert!(SchemaParser::parse(Rule::struct_type_decl, case).is_err());
    }
}

#[test]
fn test_parse_decl_returns_payload() {
    let pair = parse_decl(Rule::column_def_decl, "tags ARRAY<STRING>").unwrap();
    assert_eq!(pair.as_rule(), Rule::column_def);
    assert_eq!(pair.as_str(), "tags ARRAY<STRING>");
    let parts: Vec<(Rule, &str)> = pair.into_inner().map(|p| (p.as_rule(), p.as_str())).collect();
    assert_eq!(
        parts,
        vec![
            (Rule::column_name, "tags"),
            (Rule::column_type, "ARRAY<STRING>"),
        ]
    );
}
