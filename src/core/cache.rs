use crate::core::clock::Clock;
use crate::core::error::StoreError;
use crate::core::price::CachedPrice;
use crate::core::symbol::Symbol;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// A storage tier holding at most one price per symbol.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn load(&self, symbol: &Symbol) -> Result<Option<CachedPrice>, StoreError>;

    /// Create-or-overwrite the entry for `entry.symbol`.
    async fn upsert(&self, entry: &CachedPrice) -> Result<(), StoreError>;
}

/// Freshness policy over one or more storage tiers.
///
/// Tiers are ordered fastest first. All tiers share one window and one clock.
#[derive(Clone)]
pub struct FreshnessCache {
    tiers: Vec<Arc<dyn PriceStore>>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl FreshnessCache {
    pub fn new(tiers: Vec<Arc<dyn PriceStore>>, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tiers,
            window,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the entry only when it exists in some tier and is still fresh.
    /// Missing and stale are indistinguishable to the caller.
    pub async fn lookup(&self, symbol: &Symbol) -> Option<CachedPrice> {
        let now = self.clock.now();

        for (index, tier) in self.tiers.iter().enumerate() {
            let entry = match tier.load(symbol).await {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    warn!(tier = tier.name(), %symbol, error = %e, "Cache read failed");
                    continue;
                }
            };

            if !entry.is_fresh(now, self.window) {
                debug!(
                    tier = tier.name(),
                    %symbol,
                    age_secs = entry.age(now).num_seconds(),
                    "Cache entry stale"
                );
                continue;
            }

            debug!(
                tier = tier.name(),
                %symbol,
                age_secs = entry.age(now).num_seconds(),
                "Cache HIT"
            );
            self.backfill(&self.tiers[..index], &entry).await;
            return Some(entry);
        }

        debug!(%symbol, "Cache MISS");
        None
    }

    /// Writes through every tier. A failing tier is logged and skipped.
    pub async fn store(&self, symbol: &Symbol, price: f64, now: DateTime<Utc>) {
        let entry = CachedPrice::new(symbol.clone(), price, now);
        for tier in &self.tiers {
            match tier.upsert(&entry).await {
                Ok(()) => debug!(tier = tier.name(), %symbol, price, "Cache PUT"),
                Err(e) => warn!(tier = tier.name(), %symbol, error = %e, "Cache write failed"),
            }
        }
    }

    async fn backfill(&self, tiers: &[Arc<dyn PriceStore>], entry: &CachedPrice) {
        for tier in tiers {
            if let Err(e) = tier.upsert(entry).await {
                warn!(tier = tier.name(), symbol = %entry.symbol, error = %e, "Cache backfill failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::store::memory::MemoryPriceStore;
    use chrono::TimeZone;

    struct BrokenStore;

    #[async_trait]
    impl PriceStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn load(&self, _symbol: &Symbol) -> Result<Option<CachedPrice>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }

        async fn upsert(&self, _entry: &CachedPrice) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 14, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_store_then_lookup_within_and_past_window() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = FreshnessCache::new(
            vec![Arc::new(MemoryPriceStore::new())],
            Duration::minutes(60),
            clock.clone(),
        );
        let symbol = Symbol::normalize("AAPL");

        cache.store(&symbol, 10.0, start()).await;

        clock.advance(Duration::seconds(30));
        let hit = cache.lookup(&symbol).await.expect("fresh entry");
        assert_eq!(hit.price, 10.0);
        assert_eq!(hit.observed_at, start());

        clock.set(start() + Duration::minutes(60) + Duration::seconds(1));
        assert!(cache.lookup(&symbol).await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_missing_symbol() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = FreshnessCache::new(
            vec![Arc::new(MemoryPriceStore::new())],
            Duration::minutes(5),
            clock,
        );
        assert!(cache.lookup(&Symbol::normalize("MSFT")).await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_backfills_faster_tier() {
        let clock = Arc::new(ManualClock::new(start()));
        let front = Arc::new(MemoryPriceStore::new());
        let back = Arc::new(MemoryPriceStore::new());
        let symbol = Symbol::normalize("IBM");
        back.upsert(&CachedPrice::new(symbol.clone(), 187.5, start()))
            .await
            .unwrap();

        let cache = FreshnessCache::new(
            vec![front.clone(), back.clone()],
            Duration::minutes(5),
            clock,
        );

        assert_eq!(cache.lookup(&symbol).await.unwrap().price, 187.5);
        assert_eq!(front.load(&symbol).await.unwrap().unwrap().price, 187.5);
    }

    #[tokio::test]
    async fn test_stale_front_tier_falls_through_to_fresh_back_tier() {
        let clock = Arc::new(ManualClock::new(start()));
        let front = Arc::new(MemoryPriceStore::new());
        let back = Arc::new(MemoryPriceStore::new());
        let symbol = Symbol::normalize("IBM");
        front
            .upsert(&CachedPrice::new(symbol.clone(), 1.0, start() - Duration::hours(2)))
            .await
            .unwrap();
        back.upsert(&CachedPrice::new(symbol.clone(), 2.0, start()))
            .await
            .unwrap();

        let cache = FreshnessCache::new(vec![front, back], Duration::minutes(5), clock);
        assert_eq!(cache.lookup(&symbol).await.unwrap().price, 2.0);
    }

    #[tokio::test]
    async fn test_broken_tier_does_not_block_others() {
        let clock = Arc::new(ManualClock::new(start()));
        let healthy = Arc::new(MemoryPriceStore::new());
        let cache = FreshnessCache::new(
            vec![Arc::new(BrokenStore), healthy.clone()],
            Duration::minutes(5),
            clock,
        );
        let symbol = Symbol::normalize("TSLA");

        cache.store(&symbol, 250.0, start()).await;
        assert_eq!(healthy.load(&symbol).await.unwrap().unwrap().price, 250.0);
        assert_eq!(cache.lookup(&symbol).await.unwrap().price, 250.0);
    }
}
