//! Pricing abstractions and core types

use crate::core::error::QuoteError;
use crate::core::symbol::Symbol;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Last known price for a symbol and the time it was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPrice {
    pub symbol: Symbol,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl CachedPrice {
    pub fn new(symbol: Symbol, price: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            price,
            observed_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.observed_at
    }

    /// An entry whose age equals the window is still fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) <= window
    }
}

/// The caller's view of an asset for a single resolution.
#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub asset_kind: String,
    pub symbol: String,
    pub stored_value: f64,
    pub source: String,
}

impl PriceQuery {
    pub fn new(asset_kind: &str, symbol: &str, stored_value: f64, source: &str) -> Self {
        Self {
            asset_kind: asset_kind.to_string(),
            symbol: symbol.to_string(),
            stored_value,
            source: source.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionOutcome {
    pub price: f64,
    /// False when the stored value was returned (ineligible or fetch failed).
    pub used_live: bool,
}

impl ResolutionOutcome {
    pub fn live(price: f64) -> Self {
        Self {
            price,
            used_live: true,
        }
    }

    pub fn stored(price: f64) -> Self {
        Self {
            price,
            used_live: false,
        }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn fetch_price(&self, symbol: &Symbol) -> Result<f64, QuoteError>;
}
