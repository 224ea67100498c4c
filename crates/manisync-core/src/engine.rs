use crate::discovery::Discovery;
use crate::interrupt::shutdown_requested;
use crate::report::{SyncReport, TargetOutcome, TargetReport};
use crate::writer::write_atomic;
use crate::{io_err, SyncConfig, SyncError};
use manisync_schema::{ManifestDocument, ManifestError, TablePath};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;
use tracing::{debug, info, warn};

/// Field values looked up from the root manifest, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFields {
    fields: Vec<(String, Value)>,
}

impl ResolvedFields {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Look up every key in the root's `table`. Fails on the first missing one,
/// so a bad key is reported before any target is read. Repeated keys are
/// kept once.
pub fn resolve_fields(
    root: &ManifestDocument,
    table: &TablePath,
    keys: &[String],
) -> Result<ResolvedFields, ManifestError> {
    let mut fields: Vec<(String, Value)> = Vec::with_capacity(keys.len());
    for key in keys {
        if fields.iter().any(|(k, _)| k == key) {
            continue;
        }
        let value = root.field(table, key)?.clone();
        fields.push((key.clone(), value));
    }
    Ok(ResolvedFields { fields })
}

/// Copies the configured fields from the root manifest into every other
/// manifest of the same name under the search root.
///
/// Targets are processed one at a time in discovery order. The first error
/// stops the run; files rewritten before it stay rewritten. A file reached
/// through several paths (symlinks) is processed once, at its first path.
pub struct Synchronizer {
    config: SyncConfig,
    interrupted: fn() -> bool,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            interrupted: shutdown_requested,
        }
    }

    /// Replace the check consulted between targets to stop a run early.
    #[must_use]
    pub fn with_interrupt_check(mut self, check: fn() -> bool) -> Self {
        self.interrupted = check;
        self
    }

    #[inline]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn run(&self) -> Result<SyncReport, SyncError> {
        self.config.validate()?;

        let root_path = self.config.root_path();
        let root = ManifestDocument::load(&root_path).map_err(|source| SyncError::RootLoad {
            path: root_path.clone(),
            source,
        })?;
        let fields = resolve_fields(&root, &self.config.table, &self.config.keys)?;
        debug!(
            "resolved {} field(s) from {}",
            fields.len(),
            root_path.display()
        );

        let file_name = root_path.file_name().ok_or_else(|| {
            SyncError::Config(format!(
                "root manifest path has no file name: {}",
                root_path.display()
            ))
        })?;
        let root_canonical = fs::canonicalize(&root_path).map_err(|e| io_err(&root_path, e))?;

        let candidates = Discovery {
            file_name,
            exclude: &self.config.exclude,
            follow_links: self.config.follow_links,
        }
        .run(&self.config.search_root)?;

        let mut report = SyncReport {
            root: root_path.clone(),
            table: self.config.table.to_string(),
            keys: fields.iter().map(|(k, _)| k.to_owned()).collect(),
            dry_run: self.config.dry_run,
            targets: Vec::new(),
        };

        let mut seen: HashSet<PathBuf> = HashSet::new();
        for path in candidates {
            let canonical = fs::canonicalize(&path).map_err(|e| io_err(&path, e))?;
            if canonical == root_canonical {
                debug!("skipping root manifest {}", path.display());
                continue;
            }
            if !seen.insert(canonical) {
                debug!("skipping {} (already processed)", path.display());
                continue;
            }
            if (self.interrupted)() {
                warn!("interrupted before {}", path.display());
                return Err(SyncError::Interrupted {
                    updated: report.updated(),
                });
            }
            report.targets.push(self.sync_target(path, &fields)?);
        }

        Ok(report)
    }

    fn sync_target(&self, path: PathBuf, fields: &ResolvedFields) -> Result<TargetReport, SyncError> {
        let mut doc = ManifestDocument::load(&path).map_err(|e| target_load_error(&path, e))?;

        let mut changed_keys = Vec::new();
        for (key, value) in fields.iter() {
            if doc.set_field(&self.config.table, key, value.clone())? {
                changed_keys.push(key.to_owned());
            }
        }

        let outcome = if changed_keys.is_empty() {
            debug!("{} already in sync", path.display());
            TargetOutcome::Unchanged
        } else if self.config.dry_run {
            info!("[dry-run] would update {}", path.display());
            TargetOutcome::WouldUpdate
        } else {
            let content = doc.to_toml_string()?;
            write_atomic(&path, &content)?;
            info!("updated {} ({})", path.display(), changed_keys.join(", "));
            TargetOutcome::Updated
        };

        Ok(TargetReport {
            path,
            outcome,
            changed_keys,
        })
    }
}

fn target_load_error(path: &Path, err: ManifestError) -> SyncError {
    match err {
        ManifestError::Read { path, source } => SyncError::Io { path, source },
        source => SyncError::TargetParse {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Copy `keys` from `root_path` into every same-named manifest under
/// `search_root`. Returns the number of files rewritten.
///
/// Targets whose fields already match the root are left byte-for-byte as they
/// are and not counted, so an already synced tree returns 0 and keeps its
/// formatting.
pub fn sync(keys: &[String], root_path: &Path, search_root: &Path) -> Result<usize, SyncError> {
    let config = SyncConfig {
        keys: keys.to_vec(),
        root: Some(root_path.to_path_buf()),
        search_root: search_root.to_path_buf(),
        ..SyncConfig::default()
    };
    Synchronizer::new(config).run().map(|report| report.updated())
}

#[cfg(test)]
mod tests {
    use super::*;
    use manisync_schema::parse_manifest_str;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| (*k).to_owned()).collect()
    }

    #[test]
    fn resolve_fields_keeps_request_order_and_drops_repeats() {
        let root = parse_manifest_str(
            "[package]\nname = \"root\"\nversion = \"1.2.0\"\nlicense = \"MIT\"\n",
        )
        .unwrap();
        let fields = resolve_fields(
            &root,
            &TablePath::default(),
            &keys(&["license", "version", "license"]),
        )
        .unwrap();
        let order: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(order, ["license", "version"]);
        assert_eq!(fields.get("version").and_then(Value::as_str), Some("1.2.0"));
    }

    #[test]
    fn resolve_fields_fails_on_missing_key() {
        let root = parse_manifest_str("[package]\nversion = \"1.2.0\"\n").unwrap();
        let err =
            resolve_fields(&root, &TablePath::default(), &keys(&["version", "nonexistent"]))
                .unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { key, .. } if key == "nonexistent"));
    }

    #[test]
    fn resolve_fields_fails_on_missing_table() {
        let root = parse_manifest_str("[workspace]\nmembers = []\n").unwrap();
        let err = resolve_fields(&root, &TablePath::default(), &keys(&["version"])).unwrap_err();
        assert!(matches!(err, ManifestError::MissingTable { .. }));
    }

    #[test]
    fn target_read_failure_maps_to_io() {
        let err = target_load_error(
            Path::new("a/Cargo.toml"),
            ManifestError::Read {
                path: PathBuf::from("a/Cargo.toml"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            },
        );
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn interrupt_check_stops_before_first_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nversion = \"1.2.0\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        let target = dir.path().join("a/Cargo.toml");
        fs::write(&target, "[package]\nversion = \"0.0.1\"\n").unwrap();

        let config = SyncConfig {
            search_root: dir.path().to_path_buf(),
            ..SyncConfig::new(["version"])
        };
        let result = Synchronizer::new(config)
            .with_interrupt_check(|| true)
            .run();
        assert!(matches!(result, Err(SyncError::Interrupted { updated: 0 })));
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "[package]\nversion = \"0.0.1\"\n"
        );
    }
}
