use std::path::PathBuf;
use std::time::Duration;

use autoupdate_fetch::{DEFAULT_MAX_CONCURRENT, DEFAULT_TIMEOUT, TlsPolicy};
use serde::Deserialize;

use crate::CacheError;

/// Settings for a [`CatalogCache`](crate::CatalogCache) and the network
/// access behind it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root of the cache; defaults to `$HOME/.autoupdate/cache`.
    pub cache_dir:      Option<PathBuf>,
    /// Connect, read and open timeout for every fetch.
    pub timeout_ms:     u64,
    pub max_concurrent: usize,
    pub tls:            TlsPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir:      None,
            timeout_ms:     DEFAULT_TIMEOUT.as_millis() as u64,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            tls:            TlsPolicy::default(),
        }
    }
}

impl CacheConfig {
    pub const CACHE_DIR_ENV: &'static str = "AUTOUPDATE_CACHE_DIR";

    pub fn from_env() -> Self {
        Self {
            cache_dir: std::env::var_os(Self::CACHE_DIR_ENV).map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The directory the cache lives in.
    pub fn resolve_root(&self) -> Result<PathBuf, CacheError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => home::home_dir()
                .map(|home| home.join(".autoupdate").join("cache"))
                .ok_or(CacheError::NoCacheDir),
        }
    }

    /// Network access backed by reqwest, configured from these settings.
    #[cfg(feature = "reqwest")]
    pub fn network(&self) -> autoupdate_fetch::NetworkAccess<autoupdate_fetch::ReqwestClient> {
        autoupdate_fetch::NetworkAccess::with_max_concurrent(
            autoupdate_fetch::ReqwestClient::new(self.tls),
            self.max_concurrent,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.tls, TlsPolicy::Strict);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{ "timeout_ms": 500, "tls": "accept-all" }"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(500));
        assert_eq!(config.tls, TlsPolicy::AcceptAll);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
    }

    #[test]
    fn test_explicit_dir_wins() {
        let config = CacheConfig::default().cache_dir("/var/cache/autoupdate");
        assert_eq!(
            config.resolve_root().unwrap(),
            PathBuf::from("/var/cache/autoupdate")
        );
    }
}
