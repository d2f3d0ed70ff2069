pub mod alpha_vantage;
pub mod util;
pub mod yahoo_finance;

use crate::core::config::ProviderConfig;
use crate::core::price::QuoteProvider;
use alpha_vantage::AlphaVantageProvider;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use yahoo_finance::YahooFinanceProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Yahoo,
    AlphaVantage,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "alphavantage" => Ok(ProviderKind::AlphaVantage),
            _ => Err(anyhow::anyhow!("Unknown market data provider: {}", s)),
        }
    }
}

impl ProviderKind {
    /// Maps a configured name to a provider. Absent or unknown names select
    /// the default, so selection itself never fails.
    pub fn from_config(name: Option<&str>) -> Self {
        match name {
            None => ProviderKind::default(),
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default provider");
                ProviderKind::default()
            }),
        }
    }
}

/// Builds the adapter named by the configuration.
pub fn select_provider(config: &ProviderConfig) -> Result<Arc<dyn QuoteProvider>> {
    let kind = ProviderKind::from_config(config.name.as_deref());
    let client = util::build_client(Duration::from_secs(config.timeout_secs))
        .context("Failed to build HTTP client")?;
    debug!(provider = ?kind, "Selected market data provider");

    let provider: Arc<dyn QuoteProvider> = match kind {
        ProviderKind::Yahoo => Arc::new(YahooFinanceProvider::new(&config.yahoo.base_url, client)),
        ProviderKind::AlphaVantage => Arc::new(AlphaVantageProvider::new(
            &config.alphavantage.base_url,
            config.alphavantage.api_key(),
            client,
        )),
    };
    Ok(provider)
}
