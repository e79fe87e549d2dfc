use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoupdate_catalog::CatalogCache;
use autoupdate_fetch::ReqwestClient;
use clap::{Parser, Subcommand};

use crate::cli::{items, license, list, refresh};
use crate::settings::Settings;

pub type Cache = Arc<CatalogCache<ReqwestClient>>;

#[derive(Clone, Debug, Parser)]
#[command(name = "autoupdate", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// TOML settings file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Cache root; overrides the settings file and `AUTOUPDATE_CACHE_DIR`.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "r", name = "refresh", about = "Download a catalog into the cache")]
    Refresh(refresh::RefreshArg),
    #[command(alias = "i", name = "items", about = "Show the items of a cached catalog")]
    Items(items::ItemsArg),
    #[command(alias = "l", name = "license", about = "Print a license text")]
    License(license::LicenseArg),
    #[command(alias = "ls", name = "list", about = "List cached catalogs")]
    List(list::ListArg),
}

impl App {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref(), self.cache_dir)?;
        let cache = CatalogCache::open(&settings.cache, settings.cache.network())
            .context("Failed to open catalog cache")?;
        let cache = Arc::new(cache);

        match self.cmd {
            Commands::Refresh(arg) => arg.run(&settings, cache).await,
            Commands::Items(arg) => arg.run(&settings, cache).await,
            Commands::License(arg) => arg.run(&cache).await,
            Commands::List(arg) => arg.run(&settings, &cache).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refresh() {
        let app = App::try_parse_from([
            "autoupdate",
            "--cache-dir",
            "/tmp/cache",
            "refresh",
            "release",
            "https://updates.example.org/release.json",
        ])
        .unwrap();

        assert_eq!(app.cache_dir, Some(PathBuf::from("/tmp/cache")));
        match app.cmd {
            Commands::Refresh(arg) => {
                assert_eq!(arg.name, "release");
                assert_eq!(
                    arg.url.unwrap().as_str(),
                    "https://updates.example.org/release.json"
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let app = App::try_parse_from(["autoupdate", "ls", "--config", "settings.toml"]).unwrap();
        assert_eq!(app.config, Some(PathBuf::from("settings.toml")));
        assert!(matches!(app.cmd, Commands::List(_)));
    }

    #[test]
    fn test_license_url_must_parse() {
        let err = App::try_parse_from(["autoupdate", "license", "mit", "--url", "not a url"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        App::command().debug_assert();
    }
}
