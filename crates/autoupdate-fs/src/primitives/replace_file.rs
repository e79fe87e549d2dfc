use crate::{Error, Result};
use std::path::Path;
use tempfile::TempPath;

/// How a staged file reached its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Atomic rename; readers saw either the old or the new file.
    Renamed,
    /// The rename failed and the content was copied instead. The copy is not
    /// atomic: a reader not holding the destination's lock may observe a
    /// partially written file.
    Copied,
}

/// Move `staged` over `dest`, replacing any existing file.
///
/// Falls back to copy + delete when the rename fails (for example across
/// filesystems). Only a failure of the fallback is an error.
pub fn replace_file(staged: TempPath, dest: impl AsRef<Path>) -> Result<Placement> {
    let dest = dest.as_ref();

    match staged.persist(dest) {
        Ok(()) => Ok(Placement::Renamed),
        Err(err) => copy_into_place(err.path, dest),
    }
}

/// Copy `staged` over `dest`, then delete `staged`.
fn copy_into_place(staged: TempPath, dest: &Path) -> Result<Placement> {
    std::fs::copy(&staged, dest).map_err(|source| Error::Replace {
        path: dest.to_path_buf(),
        source,
    })?;
    // A leftover staging file is harmless; the next refresh stages a new one.
    let _ = staged.close();

    Ok(Placement::Copied)
}
