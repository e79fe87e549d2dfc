use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Which kind of update center a catalog belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Standard,
    Beta,
    Community,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Standard => write!(f, "standard"),
            Category::Beta => write!(f, "beta"),
            Category::Community => write!(f, "community"),
        }
    }
}

/// One installable unit listed by a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id:           String,
    pub version:      String,
    pub display_name: Option<String>,
    pub category:     Category,
    pub download_url: Option<String>,
    pub size:         Option<u64>,
    /// Name of the license the item is distributed under.
    pub license:      Option<String>,
}

/// Everything a parser extracts from one catalog document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCatalog {
    pub description:         Option<String>,
    pub content_description: Option<String>,
    pub items:               HashMap<String, CatalogItem>,
    /// License texts embedded in the document, by license name.
    pub licenses:            HashMap<String, String>,
}

/// Defaults a parser takes from the provider that asked for the parse.
#[derive(Clone, Copy, Debug)]
pub struct ParseContext<'a> {
    pub provider_name: &'a str,
    pub category:      Category,
}

/// Turns a cached catalog file into items.
pub trait CatalogParser: Send + Sync {
    fn parse(&self, path: &Path, context: &ParseContext<'_>) -> Result<ParsedCatalog, ParseError>;
}

/// Parser for JSON catalogs, plain or gzip-compressed.
///
/// ```json
/// {
///   "description": "Release update center",
///   "items": [
///     { "id": "org.example.editor", "version": "1.2",
///       "license": { "name": "apache-2.0", "text": "..." } }
///   ]
/// }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCatalogParser;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Deserialize)]
struct RawCatalog {
    description:         Option<String>,
    content_description: Option<String>,
    #[serde(default)]
    items:               Vec<RawItem>,
}

#[derive(Deserialize)]
struct RawItem {
    id:           String,
    version:      String,
    display_name: Option<String>,
    category:     Option<Category>,
    download_url: Option<String>,
    size:         Option<u64>,
    license:      Option<RawLicense>,
}

#[derive(Deserialize)]
struct RawLicense {
    name: String,
    text: Option<String>,
}

impl CatalogParser for JsonCatalogParser {
    fn parse(&self, path: &Path, context: &ParseContext<'_>) -> Result<ParsedCatalog, ParseError> {
        let read_error = |source: std::io::Error| ParseError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut bytes = std::fs::read(path).map_err(read_error)?;
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut inflated = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut inflated)
                .map_err(read_error)?;
            bytes = inflated;
        }

        let raw: RawCatalog = serde_json::from_slice(&bytes).map_err(|source| ParseError::Format {
            path: path.to_path_buf(),
            source,
        })?;

        let mut catalog = ParsedCatalog {
            description: raw.description,
            content_description: raw.content_description,
            ..ParsedCatalog::default()
        };

        for item in raw.items {
            let license = item.license.map(|license| {
                if let Some(text) = license.text {
                    catalog.licenses.insert(license.name.clone(), text);
                }
                license.name
            });
            catalog.items.insert(
                item.id.clone(),
                CatalogItem {
                    id: item.id,
                    version: item.version,
                    display_name: item.display_name,
                    category: item.category.unwrap_or(context.category),
                    download_url: item.download_url,
                    size: item.size,
                    license,
                },
            );
        }

        tracing::debug!(
            provider = context.provider_name,
            items = catalog.items.len(),
            path = %path.display(),
            "parsed catalog"
        );
        Ok(catalog)
    }
}
