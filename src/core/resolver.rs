//! Decides between a cached price, a live quote and the caller's stored value.

use crate::core::cache::FreshnessCache;
use crate::core::error::StoreError;
use crate::core::holdings::{Holding, HoldingsRepository};
use crate::core::price::{PriceQuery, QuoteProvider, ResolutionOutcome};
use crate::core::symbol::{Symbol, is_live_priced};
use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct PriceResolver {
    cache: FreshnessCache,
    provider: Arc<dyn QuoteProvider>,
    holdings: Arc<dyn HoldingsRepository>,
}

impl PriceResolver {
    pub fn new(
        cache: FreshnessCache,
        provider: Arc<dyn QuoteProvider>,
        holdings: Arc<dyn HoldingsRepository>,
    ) -> Self {
        Self {
            cache,
            provider,
            holdings,
        }
    }

    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    /// Resolves the current price for one asset.
    ///
    /// Never fails: ineligible assets and any fetch failure yield
    /// `query.stored_value`. No retry happens within a call.
    #[instrument(skip(self, query), fields(symbol = %query.symbol, kind = %query.asset_kind))]
    pub async fn resolve(&self, query: &PriceQuery) -> ResolutionOutcome {
        if !is_live_priced(&query.asset_kind, &query.symbol, &query.source) {
            return ResolutionOutcome::stored(query.stored_value);
        }

        let symbol = Symbol::normalize(&query.symbol);
        if let Some(cached) = self.cache.lookup(&symbol).await {
            debug!(price = cached.price, "Using cached price");
            return ResolutionOutcome::live(cached.price);
        }

        match self.provider.fetch_price(&symbol).await {
            Ok(price) => {
                info!(provider = self.provider.name(), price, "Fetched live price");
                let now = self.cache.clock().now();
                self.cache.store(&symbol, price, now).await;
                self.propagate_price(&symbol, price).await;
                ResolutionOutcome::live(price)
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    stored = query.stored_value,
                    "Price fetch failed, using stored value"
                );
                ResolutionOutcome::stored(query.stored_value)
            }
        }
    }

    /// Entry point for record handlers. The error is always `Ok`; failures
    /// surface only as the stored value being returned.
    pub async fn resolve_value(
        &self,
        asset_kind: &str,
        symbol: &str,
        stored_value: f64,
        source: &str,
    ) -> Result<f64> {
        let query = PriceQuery::new(asset_kind, symbol, stored_value, source);
        Ok(self.resolve(&query).await.price)
    }

    /// Pushes a fresh price into every record that stores a copy of it.
    /// Failures are logged and reported as `None`; they never undo the cache write.
    pub async fn propagate_price(&self, symbol: &Symbol, price: f64) -> Option<u64> {
        let now = self.cache.clock().now();
        match self.holdings.update_market_price(symbol, price, now).await {
            Ok(rows) => {
                debug!(%symbol, rows, "Updated holdings with fresh price");
                Some(rows)
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Failed to update holdings");
                None
            }
        }
    }

    /// Resolves every market-priced holding concurrently. Holdings that share
    /// a stale symbol may each trigger a fetch.
    pub async fn refresh_holdings(&self) -> Result<Vec<(Holding, ResolutionOutcome)>, StoreError> {
        let holdings = self.holdings.list_market_holdings().await?;
        let queries: Vec<PriceQuery> = holdings
            .iter()
            .map(|h| PriceQuery::new(&h.asset_kind, &h.name, h.current_value, &h.source))
            .collect();

        let outcomes = join_all(queries.iter().map(|q| self.resolve(q))).await;
        Ok(holdings.into_iter().zip(outcomes).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, ManualClock};
    use crate::core::error::QuoteError;
    use crate::core::holdings::NoHoldings;
    use crate::store::memory::MemoryPriceStore;
    use crate::store::sqlite::{SqliteDatabase, SqliteHoldings};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        price: Mutex<Option<f64>>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn returning(price: f64) -> Self {
            Self {
                price: Mutex::new(Some(price)),
                call_count: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                price: Mutex::new(None),
                call_count: AtomicUsize::new(0),
            }
        }

        fn set_price(&self, price: Option<f64>) {
            *self.price.lock().unwrap() = price;
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn fetch_price(&self, symbol: &Symbol) -> Result<f64, QuoteError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.price.lock().unwrap().ok_or_else(|| QuoteError::Status {
                symbol: symbol.to_string(),
                status: 502,
            })
        }
    }

    struct BrokenHoldings;

    #[async_trait]
    impl HoldingsRepository for BrokenHoldings {
        async fn update_market_price(
            &self,
            _symbol: &Symbol,
            _price: f64,
            _at: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }

        async fn list_market_holdings(&self) -> Result<Vec<Holding>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 15, 14, 30, 0).unwrap()
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        provider: Arc<MockProvider>,
        resolver: PriceResolver,
    }

    fn fixture(provider: MockProvider, holdings: Arc<dyn HoldingsRepository>) -> Fixture {
        let clock = Arc::new(ManualClock::new(t0()));
        let provider = Arc::new(provider);
        let cache = FreshnessCache::new(
            vec![Arc::new(MemoryPriceStore::new())],
            Duration::minutes(60),
            clock.clone(),
        );
        let resolver = PriceResolver::new(cache, provider.clone(), holdings);
        Fixture {
            clock,
            provider,
            resolver,
        }
    }

    #[tokio::test]
    async fn test_ineligible_symbols_return_stored_value() {
        let f = fixture(MockProvider::returning(1.0), Arc::new(NoHoldings));
        for symbol in ["", "TOOLONG", "BRK.B", "aapl", "A1", "   "] {
            let outcome = f
                .resolver
                .resolve(&PriceQuery::new("stock", symbol, 300.0, "market_api"))
                .await;
            assert_eq!(outcome, ResolutionOutcome::stored(300.0), "{symbol:?}");
        }
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_stock_or_manual_source_returns_stored_value() {
        let f = fixture(MockProvider::returning(1.0), Arc::new(NoHoldings));
        f.resolver
            .cache()
            .store(&Symbol::normalize("AAPL"), 999.0, t0())
            .await;

        for (kind, source) in [("crypto", "market_api"), ("stock", "manual"), ("bond", "")] {
            let price = f
                .resolver
                .resolve_value(kind, "AAPL", 42.0, source)
                .await
                .unwrap();
            assert_eq!(price, 42.0);
        }
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_skips_provider() {
        let f = fixture(MockProvider::returning(1.0), Arc::new(NoHoldings));
        f.resolver
            .cache()
            .store(&Symbol::normalize("MSFT"), 410.0, t0())
            .await;
        f.clock.advance(Duration::minutes(59));

        let outcome = f
            .resolver
            .resolve(&PriceQuery::new("stock", "MSFT", 0.0, "market_api"))
            .await;
        assert_eq!(outcome, ResolutionOutcome::live(410.0));
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_then_cached_within_window() {
        let f = fixture(MockProvider::returning(150.25), Arc::new(NoHoldings));

        let first = f
            .resolver
            .resolve_value("stock", "AAPL", 100.0, "market_api")
            .await
            .unwrap();
        assert_eq!(first, 150.25);
        assert_eq!(f.provider.calls(), 1);

        let cached = f
            .resolver
            .cache()
            .lookup(&Symbol::normalize("AAPL"))
            .await
            .unwrap();
        assert_eq!(cached.price, 150.25);
        assert_eq!(cached.observed_at, t0());

        f.clock.advance(Duration::minutes(10));
        f.provider.set_price(Some(1.0));
        let second = f
            .resolver
            .resolve_value("stock", "AAPL", 100.0, "market_api")
            .await
            .unwrap();
        assert_eq!(second, 150.25);
        assert_eq!(f.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refreshed() {
        let f = fixture(MockProvider::returning(42.50), Arc::new(NoHoldings));
        f.resolver
            .cache()
            .store(&Symbol::normalize("IBM"), 30.0, t0())
            .await;
        f.clock.advance(Duration::minutes(61));

        let outcome = f
            .resolver
            .resolve(&PriceQuery::new("stock", "IBM", 0.0, "market_api"))
            .await;
        assert_eq!(outcome, ResolutionOutcome::live(42.50));
        assert_eq!(f.provider.calls(), 1);

        let entry = f
            .resolver
            .cache()
            .lookup(&Symbol::normalize("IBM"))
            .await
            .unwrap();
        assert_eq!(entry.observed_at, f.clock.now());
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_stored() {
        let f = fixture(MockProvider::failing(), Arc::new(NoHoldings));
        let result = f
            .resolver
            .resolve_value("stock", "AAPL", 100.0, "market_api")
            .await;
        assert_eq!(result.unwrap(), 100.0);
        assert!(
            f.resolver
                .cache()
                .lookup(&Symbol::normalize("AAPL"))
                .await
                .is_none()
        );

        // Next read retries.
        f.provider.set_price(Some(101.0));
        let retried = f
            .resolver
            .resolve_value("stock", "AAPL", 100.0, "market_api")
            .await
            .unwrap();
        assert_eq!(retried, 101.0);
        assert_eq!(f.provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_holdings_failure_does_not_block_price() {
        let f = fixture(MockProvider::returning(77.0), Arc::new(BrokenHoldings));
        let price = f
            .resolver
            .resolve_value("stock", "TSLA", 1.0, "market_api")
            .await
            .unwrap();
        assert_eq!(price, 77.0);
        assert!(
            f.resolver
                .cache()
                .lookup(&Symbol::normalize("TSLA"))
                .await
                .is_some()
        );
        assert_eq!(
            f.resolver
                .propagate_price(&Symbol::normalize("TSLA"), 77.0)
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_fetch_updates_matching_holdings() {
        let holdings = Arc::new(SqliteHoldings::new(SqliteDatabase::open_in_memory().unwrap()));
        let first = holdings
            .add_holding("AAPL", "stock", "market_api", 100.0, t0())
            .await
            .unwrap();
        let second = holdings
            .add_holding("AAPL", "stock", "market_api", 110.0, t0())
            .await
            .unwrap();

        let f = fixture(MockProvider::returning(150.25), holdings.clone());
        f.clock.advance(Duration::minutes(1));
        f.resolver
            .resolve_value("stock", "AAPL", 100.0, "market_api")
            .await
            .unwrap();

        for id in [first, second] {
            let h = holdings.get_holding(id).await.unwrap().unwrap();
            assert_eq!(h.current_value, 150.25);
            assert_eq!(h.updated_at, t0() + Duration::minutes(1));
        }
    }

    #[tokio::test]
    async fn test_lowercase_record_keeps_its_stored_value() {
        let holdings = Arc::new(SqliteHoldings::new(SqliteDatabase::open_in_memory().unwrap()));
        let named = holdings
            .add_holding("aapl", "stock", "market_api", 5.0, t0())
            .await
            .unwrap();
        holdings
            .add_holding("AAPL", "stock", "market_api", 100.0, t0())
            .await
            .unwrap();

        let f = fixture(MockProvider::returning(150.25), holdings.clone());
        let outcome = f
            .resolver
            .resolve(&PriceQuery::new("stock", "aapl", 5.0, "market_api"))
            .await;
        assert_eq!(outcome, ResolutionOutcome::stored(5.0));

        let outcome = f
            .resolver
            .resolve(&PriceQuery::new("stock", "AAPL", 100.0, "market_api"))
            .await;
        assert_eq!(outcome, ResolutionOutcome::live(150.25));

        assert_eq!(
            holdings.get_holding(named).await.unwrap().unwrap().current_value,
            5.0
        );
    }

    #[tokio::test]
    async fn test_refresh_holdings_resolves_each_record() {
        let holdings = Arc::new(SqliteHoldings::new(SqliteDatabase::open_in_memory().unwrap()));
        holdings
            .add_holding("AAPL", "stock", "market_api", 100.0, t0())
            .await
            .unwrap();
        holdings
            .add_holding("BRK.B", "stock", "market_api", 300.0, t0())
            .await
            .unwrap();

        let f = fixture(MockProvider::returning(150.25), holdings);
        let results = f.resolver.refresh_holdings().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, ResolutionOutcome::live(150.25));
        assert_eq!(results[1].1, ResolutionOutcome::stored(300.0));
        assert_eq!(f.provider.calls(), 1);
    }
}
