use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use autoupdate_catalog::{CacheConfig, CatalogProvider, Category, JsonCatalogParser};
use autoupdate_fetch::ReqwestClient;
use serde::Deserialize;
use url::Url;

use crate::cli::app::Cache;

/// Contents of the TOML settings file.
///
/// ```toml
/// cache_dir = "/var/cache/autoupdate"
/// timeout_ms = 10000
/// tls = "strict"
///
/// [catalogs.release]
/// url = "https://updates.example.org/release.json"
/// display_name = "Release plugins"
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub cache:    CacheConfig,
    pub catalogs: BTreeMap<String, CatalogSettings>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogSettings {
    pub url:          Url,
    pub display_name: Option<String>,
    #[serde(default)]
    pub category:     Category,
}

impl Settings {
    /// Read `config` if given, then apply `AUTOUPDATE_CACHE_DIR` and
    /// `cache_dir`, each taking precedence over the previous source.
    pub fn load(config: Option<&Path>, cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut settings = match config {
            Some(path) => Self::read(path)?,
            None => Self::default(),
        };

        if let Some(dir) = CacheConfig::from_env().cache_dir {
            settings.cache.cache_dir = Some(dir);
        }
        if let Some(dir) = cache_dir {
            settings.cache.cache_dir = Some(dir);
        }
        Ok(settings)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    pub fn catalog(&self, name: &str) -> Option<&CatalogSettings> {
        self.catalogs.get(name)
    }

    /// A provider for catalog `name`, reading from `url` or, failing that,
    /// the URL configured for it.
    pub fn provider(
        &self,
        cache: Cache,
        name: &str,
        url: Option<Url>,
    ) -> Result<CatalogProvider<ReqwestClient>> {
        let configured = self.catalog(name);
        let url = url
            .or_else(|| configured.map(|catalog| catalog.url.clone()))
            .with_context(|| format!("No URL given or configured for catalog `{name}`"))?;
        let display_name = configured
            .and_then(|catalog| catalog.display_name.clone())
            .unwrap_or_else(|| name.to_string());
        let category = configured.map(|catalog| catalog.category).unwrap_or_default();

        Ok(CatalogProvider::new(
            cache,
            JsonCatalogParser,
            name,
            display_name,
            url,
            category,
        ))
    }
}
