//! Defines the values a loaded fixture cell can hold, before they are rendered as SQL.
use enum_as_inner::EnumAsInner;

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
/// holds one value as read from a CSV or JSON file.
/// Values keep their textual form; whether `300` is a number or a string is decided later by the
/// column's declared type.
pub enum Cell {
    Null,
    Text(String),
    /// A JSON array, with each element converted to its textual form.
    Array(Vec<String>),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => "NULL".fmt(f),
            Cell::Text(x) => x.fmt(f),
            Cell::Array(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(String::from(s))
    }
}

/// Converts a JSON value the way the loaders see it.
/// Nested arrays and objects inside an array keep their JSON text.
impl From<serde_json::Value> for Cell {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Cell::Null,
            Value::String(s) => Cell::Text(s),
            Value::Array(items) => Cell::Array(items.into_iter().map(element_text).collect()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Returns the textual form of an array element: strings as-is, anything else as JSON.
pub fn element_text(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A sequence of cells in schema column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub items: Vec<Cell>,
}

#[test]
fn test_cell_from_json() {
    use serde_json::json;
    assert_eq!(Cell::from(json!(null)), Cell::Null);
    assert_eq!(Cell::from(json!("abc")), Cell::from("abc"));
    assert_eq!(Cell::from(json!(300)), Cell::from("300"));
    assert_eq!(Cell::from(json!(1.5)), Cell::from("1.5"));
    assert_eq!(Cell::from(json!(true)), Cell::from("true"));
    assert_eq!(Cell::from(json!({"a": 1})), Cell::from(r#"{"a":1}"#));
    assert_eq!(
        Cell::from(json!(["y", 2, null, ["z"]])),
        Cell::Array(vec![
            String::from("y"),
            String::from("2"),
            String::from("null"),
            String::from(r#"["z"]"#),
        ])
    );
}

#[test]
fn test_cell_accessors() {
    assert!(Cell::Null.is_null());
    assert_eq!(Cell::from("x").as_text(), Some(&String::from("x")));
    assert_eq!(Cell::from("x").as_array(), None);
}

#[test]
fn test_cell_display() {
    assert_eq!(Cell::Null.to_string(), "NULL");
    assert_eq!(Cell::from("abc").to_string(), "abc");
    assert_eq!(
        Cell::Array(vec![String::from("a"), String::from("b")]).to_string(),
        "[a, b]"
    );
}
