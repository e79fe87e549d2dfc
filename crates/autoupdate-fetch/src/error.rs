//! Error types for autoupdate-fetch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to connect to {url}")]
    Transport {
        url: Url,
        #[source]
        source: BoxError,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: Url, status: u16 },

    #[error("timed out fetching {url}")]
    TimedOut { url: Url },

    #[error("fetch of {url} was cancelled")]
    Cancelled { url: Url },

    #[error("redirect loop detected (more than 10 redirects) for {url}")]
    TooManyRedirects { url: Url },

    #[error("{url} redirected to unusable location {location:?}")]
    InvalidRedirect { url: Url, location: String },

    #[error("{url} promised {expected} bytes but delivered {actual}; connection closed early")]
    Truncated { url: Url, expected: u64, actual: u64 },

    #[error("{url} delivered an empty document; the server may be down")]
    EmptyBody { url: Url },

    #[error("failed to read response body from {url}")]
    Read {
        url: Url,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("fetch worker stopped unexpectedly: {0}")]
    Worker(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::TimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}
