use crate::SyncError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Recursive search for manifests sharing one file name.
///
/// Entries are visited in file-name order, so the result is stable for a
/// given tree. Hidden directories (leading `.`) and directories named in
/// `exclude` are pruned. The search root itself is always entered.
#[derive(Debug, Clone)]
pub struct Discovery<'a> {
    pub file_name: &'a OsStr,
    pub exclude: &'a [String],
    pub follow_links: bool,
}

impl Discovery<'_> {
    pub fn run(&self, search_root: &Path) -> Result<Vec<PathBuf>, SyncError> {
        let walker = WalkDir::new(search_root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_pruned(e));

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name() == self.file_name {
                debug!("discovered {}", entry.path().display());
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.exclude.iter().any(|e| *e == name)
    }
}

pub fn discover_manifests(
    search_root: &Path,
    file_name: &OsStr,
    exclude: &[String],
    follow_links: bool,
) -> Result<Vec<PathBuf>, SyncError> {
    Discovery {
        file_name,
        exclude,
        follow_links,
    }
    .run(search_root)
}
