//! Filesystem primitives for the autoupdate catalog cache.
//!
//! - [`staging_file`] + [`replace_file`]: stage next to the destination, then
//!   rename over it, with a copy fallback when rename is not possible.
//! - [`write_new`] / [`persist_new`]: write-once placement that never
//!   clobbers an existing file.
//! - [`KeyedLocks`]: per-key async mutual exclusion (one lock per cache path
//!   or license name).

mod error;
mod lock;
mod primitives;

pub use error::{Error, Result};
pub use lock::{KeyedGuard, KeyedLocks};
pub use primitives::{
    Placement, ensure_dir, persist_new, replace_file, staging_file, write_new,
};
