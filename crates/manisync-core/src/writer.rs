use crate::{io_err, SyncError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Replace `dest` with `content` atomically.
///
/// The content goes to a temp file in the same directory, is fsynced, and is
/// renamed over `dest`. The existing file's permissions are carried over so a
/// rewrite never tightens a manifest to the temp file's 0600 mode. When
/// `dest` is a symlink the file it points to is replaced and the link stays.
pub fn write_atomic(dest: &Path, content: &str) -> Result<(), SyncError> {
    let resolved = match fs::canonicalize(dest) {
        Ok(real) => real,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => dest.to_path_buf(),
        Err(e) => return Err(io_err(dest, e)),
    };
    let dest = resolved.as_path();
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| io_err(&dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| io_err(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| io_err(tmp.path(), e))?;

    if let Ok(meta) = fs::metadata(dest) {
        fs::set_permissions(tmp.path(), meta.permissions()).map_err(|e| io_err(tmp.path(), e))?;
    }

    tmp.persist(dest).map_err(|e| io_err(dest, e.error))?;
    Ok(())
}
