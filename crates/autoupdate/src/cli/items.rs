use anyhow::{Context, Result};
use clap::Args;
use tabled::Tabled;

use crate::cli::app::Cache;
use crate::settings::Settings;
use crate::utils::table::{FormatConfig, format_table, or_dash};

#[derive(Args, Clone, Debug)]
pub struct ItemsArg {
    /// Catalog name.
    pub name: String,
}

#[derive(Tabled)]
struct ItemRow {
    id:       String,
    version:  String,
    name:     String,
    category: String,
    license:  String,
}

impl ItemsArg {
    pub async fn run(self, settings: &Settings, cache: Cache) -> Result<()> {
        // Unconfigured catalogs are read straight from their cached file.
        let url = match settings.catalog(&self.name) {
            Some(catalog) => Some(catalog.url.clone()),
            None => cache.cached_url(&self.name).await?,
        };
        let Some(url) = url else {
            println!("Catalog `{}` is not cached; run `autoupdate refresh` first", self.name);
            return Ok(());
        };

        let provider = settings.provider(cache, &self.name, Some(url))?;
        let items = provider
            .items()
            .await
            .with_context(|| format!("Failed to read catalog `{}`", self.name))?;

        let mut rows: Vec<_> = items
            .into_values()
            .map(|item| ItemRow {
                name:     or_dash(item.display_name),
                category: item.category.to_string(),
                license:  or_dash(item.license),
                id:       item.id,
                version:  item.version,
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        let footer = format!("{} items", rows.len());
        let table = format_table(
            rows,
            FormatConfig {
                header: provider.description().await,
                footer: Some(footer),
            },
        );
        println!("{table}");
        Ok(())
    }
}
