use std::path::{Path, PathBuf};

use autoupdate_fetch::{DownloadSink, FetchRequest, HttpClient};
use autoupdate_fs::{persist_new, staging_file, write_new};
use tempfile::TempPath;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{blocking, validate_name};
use crate::{CacheError, CatalogCache};

impl<C: HttpClient + 'static> CatalogCache<C> {
    /// Where the license called `name` is stored.
    pub fn license_path(&self, name: &str) -> Result<PathBuf, CacheError> {
        validate_name(name)?;
        Ok(self.licenses.join(name))
    }

    /// The text of license `name`, downloading it from `source` on first use.
    ///
    /// A license that cannot be downloaded does not fail the call: an empty
    /// placeholder takes its place for the rest of the process and is removed
    /// when the cache is dropped, so a later run tries again. Returns `None`
    /// only when the license is unknown and no `source` is given.
    pub async fn license(&self, name: &str, source: Option<&Url>) -> Result<Option<String>, CacheError> {
        let path = self.license_path(name)?;
        let _guard = self.license_locks.lock(name.to_string()).await;

        let known = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| CacheError::Read {
                path: path.clone(),
                source,
            })?;
        if known {
            return read_text(&path).await.map(Some);
        }
        let Some(source) = source else {
            return Ok(None);
        };

        match self.download_license(name, source).await {
            Ok(staged) => {
                let dest = path.clone();
                blocking(move || Ok(persist_new(staged, &dest)?)).await?;
                info!(license = name, %source, "cached license");
            }
            Err(err) => {
                warn!(license = name, %source, error = %err, "license download failed; using an empty placeholder");
                let dest = path.clone();
                if blocking(move || Ok(write_new(&dest, b"")?)).await? {
                    self.placeholders().push(path.clone());
                }
            }
        }

        read_text(&path).await.map(Some)
    }

    /// Store the text of license `name` unless it is already known.
    ///
    /// Returns `true` if this call created the license. The first text stored
    /// wins; later calls, whatever their content, change nothing.
    pub async fn store_license(&self, name: &str, content: Option<&str>) -> Result<bool, CacheError> {
        let Some(content) = content else {
            return Ok(false);
        };
        let path = self.license_path(name)?;
        let _guard = self.license_locks.lock(name.to_string()).await;

        let content = content.to_owned();
        let created = blocking(move || Ok(write_new(&path, content.as_bytes())?)).await?;
        if created {
            debug!(license = name, "stored license");
        }
        Ok(created)
    }

    async fn download_license(&self, name: &str, source: &Url) -> Result<TempPath, CacheError> {
        let staged = {
            let (dir, name) = (self.licenses.clone(), name.to_string());
            blocking(move || Ok(staging_file(&dir, &name)?)).await?
        };
        let request = FetchRequest::new(source.clone()).timeout(self.timeout);
        let sink = DownloadSink::new(staged.to_path_buf()).allow_zero_length(true);

        self.network
            .fetch(request, sink)
            .await
            .map_err(|source| CacheError::Fetch {
                name: name.to_string(),
                source,
            })?;
        Ok(staged)
    }
}

async fn read_text(path: &Path) -> Result<String, CacheError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
