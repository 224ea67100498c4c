use crate::TablePath;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("table path must not be empty")]
    EmptyTablePath,
    #[error("invalid table path '{0}': segments must not be empty")]
    InvalidTablePath(String),
    #[error("{}: missing table [{table}]", path.display())]
    MissingTable { path: PathBuf, table: String },
    #[error("{}: '{table}' is not a table", path.display())]
    NotATable { path: PathBuf, table: String },
    #[error("{}: missing field '{key}' in [{table}]", path.display())]
    MissingField {
        path: PathBuf,
        table: String,
        key: String,
    },
}

/// A parsed TOML manifest together with the path it was read from.
///
/// The document is held as a plain `toml::Table`, so writing it back loses
/// comments and formatting but keeps key order.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    path: PathBuf,
    root: Table,
}

impl ManifestDocument {
    pub fn parse(path: impl Into<PathBuf>, input: &str) -> Result<Self, ManifestError> {
        let path = path.into();
        match input.parse::<Table>() {
            Ok(root) => Ok(Self { path, root }),
            Err(source) => Err(ManifestError::Parse { path, source }),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn as_table(&self) -> &Table {
        &self.root
    }

    /// Resolve `table` without creating anything along the way.
    pub fn table(&self, table: &TablePath) -> Result<&Table, ManifestError> {
        let mut current = &self.root;
        for (depth, segment) in table.segments().iter().enumerate() {
            current = match current.get(segment) {
                Some(Value::Table(inner)) => inner,
                Some(_) => return Err(self.not_a_table(table, depth)),
                None => return Err(self.missing_table(table, depth)),
            };
        }
        Ok(current)
    }

    pub fn table_mut(&mut self, table: &TablePath) -> Result<&mut Table, ManifestError> {
        let path = &self.path;
        let mut current = &mut self.root;
        for (depth, segment) in table.segments().iter().enumerate() {
            current = match current.get_mut(segment) {
                Some(Value::Table(inner)) => inner,
                Some(_) => {
                    return Err(ManifestError::NotATable {
                        path: path.clone(),
                        table: prefix(table, depth),
                    })
                }
                None => {
                    return Err(ManifestError::MissingTable {
                        path: path.clone(),
                        table: prefix(table, depth),
                    })
                }
            };
        }
        Ok(current)
    }

    pub fn field(&self, table: &TablePath, key: &str) -> Result<&Value, ManifestError> {
        self.table(table)?
            .get(key)
            .ok_or_else(|| ManifestError::MissingField {
                path: self.path.clone(),
                table: table.to_string(),
                key: key.to_owned(),
            })
    }

    /// Assign `value` to `key` in `table`. Returns whether the stored value changed.
    pub fn set_field(
        &mut self,
        table: &TablePath,
        key: &str,
        value: Value,
    ) -> Result<bool, ManifestError> {
        let target = self.table_mut(table)?;
        if target.get(key).is_some_and(|current| same_value(current, &value)) {
            return Ok(false);
        }
        target.insert(key.to_owned(), value);
        Ok(true)
    }

    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string(&self.root)?)
    }

    fn missing_table(&self, table: &TablePath, depth: usize) -> ManifestError {
        ManifestError::MissingTable {
            path: self.path.clone(),
            table: prefix(table, depth),
        }
    }

    fn not_a_table(&self, table: &TablePath, depth: usize) -> ManifestError {
        ManifestError::NotATable {
            path: self.path.clone(),
            table: prefix(table, depth),
        }
    }
}

// Structural equality where `nan` matches `nan`, so a float field holding
// NaN does not count as a change on every run.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => {
            x == y || (x.is_nan() && y.is_nan() && x.is_sign_negative() == y.is_sign_negative())
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Table(xs), Value::Table(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| same_value(x, y)))
        }
        _ => a == b,
    }
}

// Dotted name of the first `depth + 1` segments, for error messages.
fn prefix(table: &TablePath, depth: usize) -> String {
    table.segments()[..=depth].join(".")
}

pub fn parse_manifest_str(input: &str) -> Result<ManifestDocument, ManifestError> {
    ManifestDocument::parse(PathBuf::new(), input)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ManifestDocument, ManifestError> {
    ManifestDocument::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRATE_MANIFEST: &str = r#"
[package]
name = "demo"
version = "0.0.1"
authors = ["Someone <someone@example.com>"]

[package.metadata.docs]
all-features = true

[dependencies]
serde = { version = "1", features = ["derive"] }
"#;

    fn package() -> TablePath {
        TablePath::default()
    }

    #[test]
    fn parses_crate_manifest() {
        let doc = parse_manifest_str(CRATE_MANIFEST).expect("should parse");
        let version = doc.field(&package(), "version").unwrap();
        assert_eq!(version.as_str(), Some("0.0.1"));
        assert!(doc.as_table().contains_key("dependencies"));
    }

    #[test]
    fn rejects_invalid_toml() {
        let err = ManifestDocument::parse("broken/Cargo.toml", "[package\nname =").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("broken/Cargo.toml"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_manifest_file(dir.path().join("Cargo.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, CRATE_MANIFEST).unwrap();
        let doc = parse_manifest_file(&path).unwrap();
        assert_eq!(doc.path(), path);
    }

    #[test]
    fn missing_field_is_reported() {
        let doc = parse_manifest_str(CRATE_MANIFEST).unwrap();
        let err = doc.field(&package(), "license").unwrap_err();
        match err {
            ManifestError::MissingField { table, key, .. } => {
                assert_eq!(table, "package");
                assert_eq!(key, "license");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_table_is_not_created() {
        let mut doc = parse_manifest_str("[workspace]\nmembers = []\n").unwrap();
        let err = doc
            .set_field(&package(), "version", Value::String("1.0.0".into()))
            .unwrap_err();
        assert!(matches!(err, ManifestError::MissingTable { .. }));
        assert!(!doc.as_table().contains_key("package"));
    }

    #[test]
    fn scalar_in_table_position_is_rejected() {
        let mut doc = parse_manifest_str("package = \"oops\"\n").unwrap();
        let err = doc
            .set_field(&package(), "version", Value::String("1.0.0".into()))
            .unwrap_err();
        assert!(matches!(err, ManifestError::NotATable { .. }));
    }

    #[test]
    fn nested_table_error_names_the_missing_prefix() {
        let doc = parse_manifest_str("[package]\nname = \"x\"\n").unwrap();
        let path: TablePath = "workspace.package".parse().unwrap();
        match doc.table(&path).unwrap_err() {
            ManifestError::MissingTable { table, .. } => assert_eq!(table, "workspace"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn set_field_reports_change() {
        let mut doc = parse_manifest_str(CRATE_MANIFEST).unwrap();
        let new_version = Value::String("1.2.0".into());
        assert!(doc
            .set_field(&package(), "version", new_version.clone())
            .unwrap());
        assert!(!doc.set_field(&package(), "version", new_version).unwrap());
        assert!(doc
            .set_field(&package(), "license", Value::String("MIT".into()))
            .unwrap());
    }

    #[test]
    fn nan_field_is_not_a_change() {
        let root = parse_manifest_str("[package]\nweight = nan\nscores = [1.0, nan]\n").unwrap();
        let mut target =
            parse_manifest_str("[package]\nweight = nan\nscores = [1.0, nan]\n").unwrap();
        for key in ["weight", "scores"] {
            let value = root.field(&package(), key).unwrap().clone();
            assert!(!target.set_field(&package(), key, value).unwrap(), "{key}");
        }
        assert!(target
            .set_field(&package(), "weight", Value::Float(1.5))
            .unwrap());
    }

    #[test]
    fn workspace_package_table_is_addressable() {
        let mut doc =
            parse_manifest_str("[workspace.package]\nversion = \"0.1.0\"\n").unwrap();
        let path: TablePath = "workspace.package".parse().unwrap();
        doc.set_field(&path, "version", Value::String("0.2.0".into()))
            .unwrap();
        assert_eq!(doc.field(&path, "version").unwrap().as_str(), Some("0.2.0"));
    }

    #[test]
    fn serialization_preserves_key_order_and_reparses() {
        let mut doc = parse_manifest_str(CRATE_MANIFEST).unwrap();
        doc.set_field(&package(), "version", Value::String("1.2.0".into()))
            .unwrap();
        let text = doc.to_toml_string().unwrap();
        let name_at = text.find("name = ").unwrap();
        let version_at = text.find("version = \"1.2.0\"").unwrap();
        assert!(name_at < version_at);

        let reparsed = parse_manifest_str(&text).unwrap();
        assert_eq!(reparsed.as_table(), doc.as_table());
    }
}
