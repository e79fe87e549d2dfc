use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;
use url::Url;

use super::access::FetchListener;
use super::http::ResponseBody;
use crate::FetchError;
use crate::core::check_copied_length;

pub const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// Streams an opened response into a file and validates what arrived.
///
/// The destination is created or truncated. On failure it is left in an
/// unspecified state; callers write into staging files they discard.
#[derive(Debug, Clone)]
pub struct DownloadSink {
    destination:       PathBuf,
    allow_zero_length: bool,
}

impl DownloadSink {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination:       destination.into(),
            allow_zero_length: false,
        }
    }

    /// Accept an empty body instead of treating it as a server outage.
    pub fn allow_zero_length(mut self, allow: bool) -> Self {
        self.allow_zero_length = allow;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn write_error(&self, source: io::Error) -> FetchError {
        FetchError::Write {
            path: self.destination.clone(),
            source,
        }
    }
}

impl FetchListener for DownloadSink {
    type Output = u64;

    async fn stream_opened(self, url: &Url, body: ResponseBody) -> Result<u64, FetchError> {
        let declared = body.content_length();
        let file = File::create(&self.destination)
            .await
            .map_err(|e| self.write_error(e))?;
        let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, file);
        let mut stream = body.into_stream();
        let mut copied = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| read_error(url, source))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| self.write_error(e))?;
            copied += chunk.len() as u64;
        }

        writer.flush().await.map_err(|e| self.write_error(e))?;
        writer
            .get_ref()
            .sync_all()
            .await
            .map_err(|e| self.write_error(e))?;

        check_copied_length(url, declared, copied, self.allow_zero_length)?;
        debug!(%url, bytes = copied, path = %self.destination.display(), "download stored");
        Ok(copied)
    }
}

fn read_error(url: &Url, source: io::Error) -> FetchError {
    if source.kind() == io::ErrorKind::TimedOut {
        FetchError::TimedOut { url: url.clone() }
    } else {
        FetchError::Read {
            url: url.clone(),
            source,
        }
    }
}
