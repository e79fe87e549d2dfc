use crate::{Error, Result};
use std::io::{self, Write};
use std::path::Path;
use tempfile::{NamedTempFile, TempPath};

/// Write `content` to `path` unless the file already exists.
///
/// The content is staged in the same directory and linked into place without
/// clobbering, so a concurrent writer can never replace a file that another
/// writer already created. Returns `false` when `path` existed.
pub fn write_new(path: impl AsRef<Path>, content: &[u8]) -> Result<bool> {
    let path = path.as_ref();
    let dir = path.parent().ok_or_else(|| Error::NoParent {
        path: path.to_path_buf(),
    })?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|source| Error::Stage {
        path: dir.to_path_buf(),
        source,
    })?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|source| Error::Write {
            path: staged.path().to_path_buf(),
            source,
        })?;

    persist_new(staged.into_temp_path(), path)
}

/// Move an already staged file to `path` unless `path` exists.
///
/// The staged file is removed in either case.
pub fn persist_new(staged: TempPath, path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match staged.persist_noclobber(path) {
        Ok(()) => Ok(true),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(Error::Write {
            path: path.to_path_buf(),
            source: err.error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_new_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("license");

        assert!(write_new(&path, b"terms").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"terms");
    }

    #[test]
    fn test_write_new_keeps_first_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("license");

        assert!(write_new(&path, b"first").unwrap());
        assert!(!write_new(&path, b"second").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_new_empty_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");

        assert!(write_new(&path, b"").unwrap());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_write_new_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("license");

        let err = write_new(&path, b"x").unwrap_err();
        assert!(matches!(err, Error::Stage { .. }));
    }
}
