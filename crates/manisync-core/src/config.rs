use crate::SyncError;
use manisync_schema::{TablePath, DEFAULT_MANIFEST_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the optional configuration file looked up in the search root.
pub const CONFIG_FILE_NAME: &str = "manisync.toml";

/// Resolved settings for one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Fields of the package table to copy, in order.
    pub keys: Vec<String>,
    /// Root manifest file name, used when `root` is unset.
    pub manifest_name: String,
    /// Explicit root manifest; defaults to `search_root/manifest_name`.
    pub root: Option<PathBuf>,
    pub search_root: PathBuf,
    pub table: TablePath,
    /// Directory names never descended into.
    pub exclude: Vec<String>,
    pub follow_links: bool,
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_owned(),
            root: None,
            search_root: PathBuf::from("."),
            table: TablePath::default(),
            exclude: Vec::new(),
            follow_links: false,
            dry_run: false,
        }
    }
}

impl SyncConfig {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Path of the root manifest this run reads from.
    pub fn root_path(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| self.search_root.join(&self.manifest_name))
    }

    /// Layer a config file over these settings. `base` is the directory the
    /// file was loaded from; a relative `root` in the file resolves against it.
    pub fn apply_file(&mut self, file: ConfigFile, base: &Path) {
        if let Some(keys) = file.keys {
            self.keys = keys;
        }
        if let Some(name) = file.manifest_name {
            self.manifest_name = name;
        }
        if let Some(root) = file.root {
            self.root = Some(if root.is_relative() {
                base.join(root)
            } else {
                root
            });
        }
        if let Some(table) = file.table {
            self.table = table;
        }
        if let Some(exclude) = file.exclude {
            self.exclude = exclude;
        }
        if let Some(follow_links) = file.follow_links {
            self.follow_links = follow_links;
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.keys.is_empty() {
            return Err(SyncError::NoKeys);
        }
        if let Some(key) = self.keys.iter().find(|k| k.trim().is_empty()) {
            return Err(SyncError::Config(format!("invalid key '{key}'")));
        }
        if self.root.is_none() {
            let name = self.manifest_name.as_str();
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(SyncError::Config(format!(
                    "manifest name must be a plain file name, got '{name}'"
                )));
            }
        }
        Ok(())
    }
}

/// On-disk configuration (`manisync.toml`). Every field is optional and
/// overrides the built-in default when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub manifest_name: Option<String>,
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub table: Option<TablePath>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub follow_links: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::io_err(path, e))?;
        toml::from_str(&content).map_err(|e| {
            SyncError::Config(format!("invalid config file {}: {e}", path.display()))
        })
    }

    /// Load `manisync.toml` from `dir` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>, SyncError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        debug!("loading config from {}", path.display());
        Self::load(&path).map(Some)
    }
}
