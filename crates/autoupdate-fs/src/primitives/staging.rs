use crate::{Error, Result};
use std::path::Path;
use tempfile::{Builder, NamedTempFile, TempPath};

/// Create a uniquely named, empty staging file next to `name` inside `dir`.
///
/// Staging in the destination directory keeps the final rename on one
/// filesystem. The file is deleted when the returned [`TempPath`] is dropped
/// unless it has been persisted.
pub fn staging_file(dir: impl AsRef<Path>, name: &str) -> Result<TempPath> {
    let dir = dir.as_ref();
    let prefix = format!(".{name}.");

    Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(dir)
        .map(NamedTempFile::into_temp_path)
        .map_err(|source| Error::Stage {
            path: dir.to_path_buf(),
            source,
        })
}

pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
