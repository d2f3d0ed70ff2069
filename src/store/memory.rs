use crate::core::cache::PriceStore;
use crate::core::error::StoreError;
use crate::core::price::CachedPrice;
use crate::core::symbol::Symbol;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Process-local price tier. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryPriceStore {
    inner: Mutex<HashMap<Symbol, CachedPrice>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, symbol: &Symbol) -> Result<Option<CachedPrice>, StoreError> {
        let cache = self.inner.lock().await;
        Ok(cache.get(symbol).cloned())
    }

    async fn upsert(&self, entry: &CachedPrice) -> Result<(), StoreError> {
        let mut cache = self.inner.lock().await;
        if let Some(existing) = cache.get(&entry.symbol)
            && existing.observed_at > entry.observed_at
        {
            debug!(symbol = %entry.symbol, "Ignoring older observation");
            return Ok(());
        }
        cache.insert(entry.symbol.clone(), entry.clone());
        Ok(())
    }
}
