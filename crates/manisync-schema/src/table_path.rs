use crate::ManifestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table holding package metadata in a Cargo manifest.
pub const DEFAULT_TABLE: &str = "package";

/// Dotted path to a table inside a manifest, e.g. `package` or
/// `workspace.package`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TablePath {
    segments: Vec<String>,
}

impl TablePath {
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ManifestError::EmptyTablePath);
        }
        let segments: Vec<String> = trimmed.split('.').map(|s| s.trim().to_owned()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(ManifestError::InvalidTablePath(input.to_owned()));
        }
        Ok(Self { segments })
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl Default for TablePath {
    fn default() -> Self {
        Self {
            segments: vec![DEFAULT_TABLE.to_owned()],
        }
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for TablePath {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TablePath {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TablePath> for String {
    fn from(path: TablePath) -> Self {
        path.to_string()
    }
}
