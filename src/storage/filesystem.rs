//! File system operations
//!
//! Local files and directories written or read by transfers.

use std::fs::{self, File};
use std::io::Result;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

const STAGING_PREFIX: &str = ".rax-";
const STAGING_SUFFIX: &str = ".part";

/// Create a directory and any missing parents
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
}

/// Open a local file for reading
pub fn open_file(path: &Path) -> Result<File> {
    File::open(path)
}

/// Create a uniquely named staging file next to `path` for a download.
///
/// The name never collides with an existing entry, so staging cannot
/// clobber a sibling. Dropping the handle removes the file.
pub fn create_staging_file(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(dir)
}

/// Move a finished download over its final path
pub fn commit_staging_file(staged: NamedTempFile, path: &Path) -> Result<()> {
    staged.persist(path).map(|_| ()).map_err(|e| e.error)
}
