//! TOML manifest declaring a set of fixture tables.
//!
//! Example manifest:
//! ```toml
//! [[table]]
//! alias = "EVENTS"
//! path = "events.csv"   # relative to the manifest's directory
//! columns = [
//!   { name = "time", type = "TIMESTAMP" },
//!   { name = "tags", type = "ARRAY<STRING>" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::temporary_tables::{self, TemporaryTables};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid fixture tables: {0}")]
    Tables(#[from] temporary_tables::Error),
}

/// Root manifest structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    /// Tables in the order they appear in the `WITH` clause.
    #[serde(default, rename = "table")]
    pub tables: Vec<TableEntry>,

    /// Directory that relative table paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableEntry {
    pub alias: String,
    pub path: PathBuf,
    pub columns: Vec<ColumnEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl FromStr for Manifest {
    type Err = ManifestError;

    /// Parses manifest text.  Relative paths resolve against the current directory.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl Manifest {
    /// Reads the manifest at `path`.  Relative table paths resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ManifestError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Manifest::from_str(&text)?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::debug!(path = %path.display(), tables = manifest.tables.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Resolves a table path.  Absolute paths are kept as they are.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn into_temporary_tables(self) -> Result<TemporaryTables, ManifestError> {
        let triples = self
            .tables
            .iter()
            .map(|t| {
                let columns: Vec<(&str, &str)> = t
                    .columns
                    .iter()
                    .map(|c| (c.name.as_str(), c.column_type.as_str()))
                    .collect();
                (self.resolve(&t.path), columns, t.alias.as_str())
            })
            .collect::<Vec<_>>();
        Ok(TemporaryTables::new(triples)?)
    }
}

#[test]
fn test_parse_manifest() {
    let text = r#"
[[table]]
alias = "EVENTS"
path = "events.csv"
columns = [
  { name = "time", type = "TIMESTAMP" },
  { name = "tags", type = "ARRAY<STRING>" },
]
"#;
    let m = Manifest::from_str(text).unwrap();
    assert_eq!(m.tables.len(), 1);
    assert_eq!(m.tables[0].alias, "EVENTS");
    assert_eq!(m.tables[0].path, PathBuf::from("events.csv"));
    assert_eq!(
        m.tables[0].columns[1],
        ColumnEntry {
            name: String::from("tags"),
            column_type: String::from("ARRAY<STRING>"),
        }
    );
}

#[test]
fn test_parse_manifest_errors() {
    assert!(matches!(
        Manifest::from_str("[[table]]\nalias = \"A\"\n"),
        Err(ManifestError::ParseError(_))
    ));
    assert!(matches!(
        Manifest::load("/nonexistent/fixtures.toml"),
        Err(ManifestError::ReadError { .. })
    ));
}

#[test]
fn test_empty_manifest_has_no_tables() {
    let m = Manifest::from_str("").unwrap();
    assert!(m.tables.is_empty());
    assert!(matches!(
        m.into_temporary_tables(),
        Err(ManifestError::Tables(temporary_tables::Error::Empty))
    ));
}

#[test]
fn test_resolve() {
    let m = Manifest {
        base_dir: PathBuf::from("/fixtures"),
        ..Default::default()
    };
    assert_eq!(m.resolve(Path::new("a.csv")), PathBuf::from("/fixtures/a.csv"));
    assert_eq!(m.resolve(Path::new("/abs/b.csv")), PathBuf::from("/abs/b.csv"));
}

#[test]
fn test_load_and_build() {
    let path = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set")
        + "/resources/test/fixtures.toml";
    let tt = Manifest::load(path).unwrap().into_temporary_tables().unwrap();
    let aliases: Vec<&str> = tt.tables().iter().map(|t| t.alias()).collect();
    assert_eq!(aliases, vec!["TEST_DATA1", "TEST_DATA2"]);
    assert!(tt.to_sql().starts_with("WITH TEST_DATA1 AS (\n"));
}
