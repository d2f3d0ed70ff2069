pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{FreshnessCache, PriceResolver, SystemClock};
use anyhow::Result;
use std::sync::Arc;
use store::Storage;
use tracing::{debug, info};

pub enum AppCommand {
    Resolve {
        symbol: String,
        kind: String,
        source: String,
        stored: f64,
    },
    Cached {
        symbol: String,
    },
    Refresh,
}

/// A resolver wired from configuration, plus the storage behind it.
pub struct App {
    pub resolver: PriceResolver,
    pub storage: Storage,
}

impl App {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let storage = Storage::open(config)?;
        let provider = providers::select_provider(&config.provider)?;
        let cache = FreshnessCache::new(
            storage.tiers.clone(),
            config.cache.freshness_window(),
            Arc::new(SystemClock),
        );
        let resolver = PriceResolver::new(cache, provider, Arc::clone(&storage.holdings));
        Ok(Self { resolver, storage })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Quote keeper starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(&config)?;

    match command {
        AppCommand::Resolve {
            symbol,
            kind,
            source,
            stored,
        } => {
            cli::resolve::run(&app.resolver, &kind, &symbol, stored, &source).await?;
        }
        AppCommand::Cached { symbol } => {
            cli::cached::run(&app, &symbol).await?;
        }
        AppCommand::Refresh => {
            cli::refresh::run(&app.resolver).await?;
        }
    }
    Ok(())
}
