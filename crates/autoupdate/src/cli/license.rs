use anyhow::{Result, bail};
use clap::Args;
use tracing::warn;
use url::Url;

use crate::cli::app::Cache;

#[derive(Args, Clone, Debug)]
pub struct LicenseArg {
    /// License name.
    pub name: String,
    /// Where to download the license if it is not cached yet.
    #[arg(long)]
    pub url:  Option<Url>,
}

impl LicenseArg {
    pub async fn run(self, cache: &Cache) -> Result<()> {
        match cache.license(&self.name, self.url.as_ref()).await? {
            Some(text) if text.is_empty() => {
                warn!(license = %self.name, "license text is unavailable");
            }
            Some(text) => println!("{text}"),
            None => bail!("License `{}` is not cached; pass --url to download it", self.name),
        }
        Ok(())
    }
}
