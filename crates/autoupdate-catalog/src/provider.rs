use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use autoupdate_fetch::HttpClient;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    CatalogCache, CatalogItem, CatalogParser, Category, JsonCatalogParser, ParseContext,
    ProviderError,
};

/// Catalog metadata learned from the last parse.
#[derive(Debug, Default)]
struct Metadata {
    description:                     Option<String>,
    description_initialized:         bool,
    content_description:             Option<String>,
    content_description_initialized: bool,
}

/// A named remote catalog, served from the shared [`CatalogCache`].
///
/// Construction only binds names and the remote URL. Nothing touches the
/// network until a forced [`refresh`](Self::refresh); [`items`](Self::items)
/// always reads whatever is cached.
pub struct CatalogProvider<C, P = JsonCatalogParser> {
    name:         String,
    display_name: String,
    url:          RwLock<Url>,
    category:     Category,
    cache:        Arc<CatalogCache<C>>,
    parser:       P,
    metadata:     Mutex<Metadata>,
}

impl<C: HttpClient + 'static, P: CatalogParser> CatalogProvider<C, P> {
    pub fn new(
        cache: Arc<CatalogCache<C>>,
        parser: P,
        name: impl Into<String>,
        display_name: impl Into<String>,
        url: Url,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            url: RwLock::new(url),
            category,
            cache,
            parser,
            metadata: Mutex::new(Metadata::default()),
        }
    }

    /// Code name; also the catalog's name in the cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn url(&self) -> Url {
        self.url
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Point the provider at a new remote catalog. Takes effect on the next
    /// forced refresh.
    pub fn set_url(&self, url: Url) {
        *self
            .url
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = url;
    }

    /// Make the cached catalog current.
    ///
    /// Without `force` this trusts the cache and reports success without any
    /// network access. With `force` the remote catalog is downloaded again
    /// and the description will be re-read on next access. Failures are
    /// logged and reported as `false`; the previously cached catalog stays.
    pub async fn refresh(&self, force: bool) -> bool {
        if !force {
            debug!(provider = %self.name, "refresh without force; using cached catalog");
            return true;
        }

        let url = self.url();
        let refreshed = self.cache.refresh(&self.name, &url).await;

        {
            let mut metadata = self.metadata();
            metadata.description_initialized = false;
            metadata.content_description_initialized = false;
        }

        match refreshed {
            Ok(cached) => {
                info!(provider = %self.name, %url, %cached, "catalog refreshed");
                true
            }
            Err(err) => {
                warn!(provider = %self.name, %url, error = %err, "catalog refresh failed");
                false
            }
        }
    }

    /// Items of the cached catalog by id; empty when nothing is cached.
    ///
    /// Parsing also records the catalog's descriptions and stores licenses
    /// embedded in it. Storing a license is best effort.
    pub async fn items(&self) -> Result<HashMap<String, CatalogItem>, ProviderError> {
        let context = ParseContext {
            provider_name: &self.name,
            category:      self.category,
        };
        let parsed = self
            .cache
            .read_cached(&self.name, |path| self.parser.parse(path, &context))
            .await?;

        let Some(parsed) = parsed else {
            debug!(provider = %self.name, "no cached catalog");
            return Ok(HashMap::new());
        };
        let parsed = parsed?;

        {
            let mut metadata = self.metadata();
            metadata.description = parsed.description;
            metadata.description_initialized = true;
            metadata.content_description = parsed.content_description;
            metadata.content_description_initialized = true;
        }

        // A license that cannot be stored never hides the catalog.
        for (license, text) in &parsed.licenses {
            if let Err(err) = self.cache.store_license(license, Some(text)).await {
                warn!(provider = %self.name, license = %license, error = %err, "cannot store embedded license");
            }
        }

        Ok(parsed.items)
    }

    pub async fn description(&self) -> Option<String> {
        let initialized = self.metadata().description_initialized;
        if !initialized {
            self.populate_metadata().await;
        }
        self.metadata().description.clone()
    }

    pub async fn content_description(&self) -> Option<String> {
        let initialized = self.metadata().content_description_initialized;
        if !initialized {
            self.populate_metadata().await;
        }
        self.metadata().content_description.clone()
    }

    async fn populate_metadata(&self) {
        if let Err(err) = self.items().await {
            warn!(provider = %self.name, error = %err, "cannot read catalog description");
        }
    }

    fn metadata(&self) -> MutexGuard<'_, Metadata> {
        self.metadata
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
