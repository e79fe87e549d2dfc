use anyhow::{Result, bail};
use clap::Args;
use url::Url;

use crate::cli::app::Cache;
use crate::settings::Settings;

#[derive(Args, Clone, Debug)]
pub struct RefreshArg {
    /// Catalog name; also its file name in the cache.
    pub name: String,
    /// Remote catalog. Defaults to the URL configured for `name`.
    pub url:  Option<Url>,
}

impl RefreshArg {
    pub async fn run(self, settings: &Settings, cache: Cache) -> Result<()> {
        let provider = settings.provider(cache, &self.name, self.url)?;
        if !provider.refresh(true).await {
            bail!("Failed to refresh catalog `{}` from {}", self.name, provider.url());
        }

        let items = provider.items().await?;
        println!("Refreshed `{}`: {} items", provider.display_name(), items.len());
        Ok(())
    }
}
