//! Local cache of remote update catalogs and license texts.
//!
//! - [`CatalogCache`]: one file per catalog under a cache root, replaced
//!   atomically on refresh, locked per file; plus a write-once license store.
//! - [`CatalogProvider`]: a named remote catalog read through the cache.
//! - [`CatalogParser`]: the seam that turns a cached file into items, with
//!   [`JsonCatalogParser`] as the default.

mod cache;
mod config;
mod error;
mod license;
mod parser;
mod provider;

pub use cache::{CacheEntry, CatalogCache, LICENSES_DIR};
pub use config::CacheConfig;
pub use error::{CacheError, ParseError, ProviderError};
pub use parser::{CatalogItem, CatalogParser, Category, JsonCatalogParser, ParseContext, ParsedCatalog};
pub use provider::CatalogProvider;
