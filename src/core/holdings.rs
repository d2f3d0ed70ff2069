//! Persisted records that carry a copy of the market price.

use crate::core::error::StoreError;
use crate::core::symbol::Symbol;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A market-priced asset record as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: i64,
    pub name: String,
    pub asset_kind: String,
    pub source: String,
    pub current_value: f64,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait HoldingsRepository: Send + Sync {
    /// Sets `current_value` on every stock record tracked from the market feed
    /// under `symbol`. Returns the number of records touched.
    async fn update_market_price(
        &self,
        symbol: &Symbol,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn list_market_holdings(&self) -> Result<Vec<Holding>, StoreError>;
}

/// Used when no relational store is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHoldings;

#[async_trait]
impl HoldingsRepository for NoHoldings {
    async fn update_market_price(
        &self,
        _symbol: &Symbol,
        _price: f64,
        _at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(0)
    }

    async fn list_market_holdings(&self) -> Result<Vec<Holding>, StoreError> {
        Ok(Vec::new())
    }
}
