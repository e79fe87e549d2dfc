use anyhow::Result;
use clap::Args;
use tabled::Tabled;

use crate::cli::app::Cache;
use crate::settings::Settings;
use crate::utils::table::{FormatConfig, format_table, or_dash};

#[derive(Args, Clone, Debug)]
pub struct ListArg {}

#[derive(Tabled)]
struct CatalogRow {
    name:   String,
    size:   String,
    source: String,
}

impl ListArg {
    pub async fn run(self, settings: &Settings, cache: &Cache) -> Result<()> {
        let entries = cache.entries().await?;
        let mut rows: Vec<_> = entries
            .iter()
            .map(|entry| CatalogRow {
                name:   entry.name.clone(),
                size:   entry.size.to_string(),
                source: or_dash(settings.catalog(&entry.name).map(|c| &c.url)),
            })
            .collect();

        // Configured catalogs that were never downloaded.
        for (name, catalog) in &settings.catalogs {
            if !entries.iter().any(|entry| &entry.name == name) {
                rows.push(CatalogRow {
                    name:   name.clone(),
                    size:   "-".to_string(),
                    source: catalog.url.to_string(),
                });
            }
        }

        if rows.is_empty() {
            println!("No catalogs in {}", cache.root().display());
            return Ok(());
        }

        let footer = format!("{} cached in {}", entries.len(), cache.root().display());
        let table = format_table(
            rows,
            FormatConfig {
                header: None,
                footer: Some(footer),
            },
        );
        println!("{table}");
        Ok(())
    }
}
