//! Error types for autoupdate-catalog.

use std::io;
use std::path::PathBuf;

use autoupdate_fetch::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache entry name {0:?}")]
    InvalidName(String),

    #[error("no cache directory configured and no home directory found")]
    NoCacheDir,

    #[error("failed to fetch {name}")]
    Fetch {
        name:   String,
        #[source]
        source: FetchError,
    },

    #[error("failed to read {path}")]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot express {path} as a file URL")]
    FileUrl { path: PathBuf },

    #[error(transparent)]
    Fs(#[from] autoupdate_fs::Error),

    #[error("filesystem worker failed")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read catalog {path}")]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed catalog {path}")]
    Format {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
