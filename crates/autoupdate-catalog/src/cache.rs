use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use autoupdate_fetch::{DownloadSink, FetchRequest, HttpClient, NetworkAccess};
use autoupdate_fs::{KeyedLocks, Placement, ensure_dir, replace_file, staging_file};
use tracing::{debug, info, warn};
use url::Url;

use crate::{CacheConfig, CacheError};

/// Subdirectory of the cache root holding license texts.
pub const LICENSES_DIR: &str = "licenses";

/// A catalog file in the cache, as seen at one moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub name:   String,
    pub path:   PathBuf,
    pub exists: bool,
    pub size:   u64,
}

/// Local cache of remote catalog documents and license texts.
///
/// Catalogs live at `<root>/<name>`, licenses at `<root>/licenses/<name>`.
/// Every operation on a catalog file holds that file's lock; every license
/// operation holds the license name's lock. Unrelated entries never wait on
/// each other.
///
/// One cache is meant to be shared (behind an `Arc`) by all providers of a
/// process.
pub struct CatalogCache<C> {
    root: PathBuf,
    pub(crate) licenses: PathBuf,
    pub(crate) timeout: Duration,
    pub(crate) network: NetworkAccess<C>,
    path_locks: KeyedLocks<PathBuf>,
    pub(crate) license_locks: KeyedLocks<String>,
    placeholders: Mutex<Vec<PathBuf>>,
}

impl<C: HttpClient + 'static> CatalogCache<C> {
    /// Create the cache root and its license directory if needed.
    pub fn open(config: &CacheConfig, network: NetworkAccess<C>) -> Result<Self, CacheError> {
        let root = config.resolve_root()?;
        ensure_dir(&root)?;
        let root = root
            .canonicalize()
            .map_err(|source| CacheError::Read { path: root, source })?;
        let licenses = root.join(LICENSES_DIR);
        ensure_dir(&licenses)?;

        info!(root = %root.display(), "opened catalog cache");
        Ok(Self {
            root,
            licenses,
            timeout: config.timeout(),
            network,
            path_locks: KeyedLocks::new(),
            license_locks: KeyedLocks::new(),
            placeholders: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn licenses_dir(&self) -> &Path {
        &self.licenses
    }

    pub fn network(&self) -> &NetworkAccess<C> {
        &self.network
    }

    /// Where the catalog called `name` is stored.
    pub fn catalog_path(&self, name: &str) -> Result<PathBuf, CacheError> {
        validate_name(name)?;
        if name == LICENSES_DIR {
            return Err(CacheError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    pub async fn entry(&self, name: &str) -> Result<CacheEntry, CacheError> {
        let path = self.catalog_path(name)?;
        let _guard = self.path_locks.lock(path.clone()).await;
        describe(name, path).await
    }

    /// All catalogs currently in the cache, sorted by name.
    pub async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let read_error = |source: io::Error| CacheError::Read {
            path: self.root.clone(),
            source,
        };

        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(read_error)?;
        while let Some(dir_entry) = dir.next_entry().await.map_err(read_error)? {
            if !dir_entry.file_type().await.map_err(read_error)?.is_file() {
                continue;
            }
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if validate_name(&name).is_ok() {
                names.push(name);
            }
        }
        names.sort();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            entries.push(self.entry(&name).await?);
        }
        Ok(entries)
    }

    /// The file URL of the cached catalog, if a non-empty one exists.
    pub async fn cached_url(&self, name: &str) -> Result<Option<Url>, CacheError> {
        let path = self.catalog_path(name)?;
        let _guard = self.path_locks.lock(path.clone()).await;

        if !is_usable(&path).await? {
            return Ok(None);
        }
        file_url(&path).map(Some)
    }

    /// Download `source` and make it the cached catalog `name`.
    ///
    /// The download goes to a staging file next to the catalog and replaces
    /// it only once complete, so readers see either the previous or the new
    /// catalog. There is no retry; every failure is returned.
    pub async fn refresh(&self, name: &str, source: &Url) -> Result<Url, CacheError> {
        let path = self.catalog_path(name)?;
        let staged = {
            let (root, name) = (self.root.clone(), name.to_string());
            blocking(move || Ok(staging_file(&root, &name)?)).await?
        };

        let request = FetchRequest::new(source.clone()).timeout(self.timeout);
        let bytes = self
            .network
            .fetch(request, DownloadSink::new(staged.to_path_buf()))
            .await
            .map_err(|source| CacheError::Fetch {
                name: name.to_string(),
                source,
            })?;

        let _guard = self.path_locks.lock(path.clone()).await;
        let placement = {
            let path = path.clone();
            blocking(move || Ok(replace_file(staged, &path)?)).await?
        };
        match placement {
            Placement::Renamed => debug!(catalog = name, "replaced cached catalog"),
            Placement::Copied => warn!(
                catalog = name,
                path = %path.display(),
                "rename failed; cached catalog was copied into place"
            ),
        }

        info!(catalog = name, %source, bytes, "refreshed cached catalog");
        file_url(&path)
    }

    /// Run `read` on the cached catalog while holding its lock.
    ///
    /// Returns `None` without calling `read` when no usable file exists.
    /// `read` runs on the calling task.
    pub async fn read_cached<R>(
        &self,
        name: &str,
        read: impl FnOnce(&Path) -> R,
    ) -> Result<Option<R>, CacheError> {
        let path = self.catalog_path(name)?;
        let _guard = self.path_locks.lock(path.clone()).await;

        if !is_usable(&path).await? {
            return Ok(None);
        }
        Ok(Some(read(&path)))
    }
}

impl<C> CatalogCache<C> {
    pub(crate) fn placeholders(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.placeholders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C> Drop for CatalogCache<C> {
    /// Placeholders stand in for licenses that failed to download; removing
    /// them makes the next process try again.
    fn drop(&mut self) {
        for path in self.placeholders().drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed license placeholder"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove license placeholder"),
            }
        }
    }
}

/// Names become file names directly, so they must be a single plain path
/// component. Leading dots are reserved for staging files.
pub(crate) fn validate_name(name: &str) -> Result<(), CacheError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Whether `path` holds a non-empty file. An empty file is reported and
/// treated as missing.
async fn is_usable(path: &Path) -> Result<bool, CacheError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() == 0 => {
            warn!(path = %path.display(), "cached catalog is empty; ignoring it");
            Ok(false)
        }
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CacheError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn describe(name: &str, path: PathBuf) -> Result<CacheEntry, CacheError> {
    let (exists, size) = match tokio::fs::metadata(&path).await {
        Ok(meta) => (meta.is_file(), meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => (false, 0),
        Err(source) => return Err(CacheError::Read { path, source }),
    };
    Ok(CacheEntry {
        name: name.to_string(),
        path,
        exists,
        size,
    })
}

/// Run synchronous filesystem work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

pub(crate) fn file_url(path: &Path) -> Result<Url, CacheError> {
    Url::from_file_path(path).map_err(|()| CacheError::FileUrl {
        path: path.to_path_buf(),
    })
}
