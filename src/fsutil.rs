//! Filesystem helpers shared by the benchmark phases.

use std::fs;
use std::io;
use std::path::Path;

/// Remove a file or directory tree, ignoring paths that are already gone.
///
/// Any other failure (permissions, busy mounts) propagates; a stale
/// artifact that cannot be cleared must not be silently reused.
pub fn rm_rf(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Total size in bytes of everything under `path`.
///
/// Recurses into subdirectories. A symbolic link contributes its own size
/// and is never followed, so link cycles cannot trap the traversal.
pub fn dir_size(path: &Path) -> io::Result<u64> {
    let mut total = 0u64;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
