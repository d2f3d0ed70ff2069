use crate::core::cache::PriceStore;
use crate::core::error::StoreError;
use crate::core::price::CachedPrice;
use crate::core::symbol::Symbol;
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "prices";

/// Durable price tier on a fjall keyspace.
///
/// The keyspace holds an exclusive lock on its directory, so this tier is
/// only suitable for a single process. Use the SQLite tier when several
/// processes share one cache.
pub struct DiskPriceStore {
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskPriceStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!(path = %path.display(), "Opened price keyspace");
        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }
}

#[async_trait]
impl PriceStore for DiskPriceStore {
    fn name(&self) -> &'static str {
        "fjall"
    }

    async fn load(&self, symbol: &Symbol) -> Result<Option<CachedPrice>, StoreError> {
        match self.partition.get(symbol.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, entry: &CachedPrice) -> Result<(), StoreError> {
        let value = serde_json::to_vec(entry)?;
        self.partition.insert(entry.symbol.as_str(), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_get_put() {
        let dir = tempdir().unwrap();
        let store = DiskPriceStore::open(dir.path()).unwrap();
        let symbol = Symbol::normalize("MSFT");
        let t0 = Utc.with_ymd_and_hms(2024, 7, 1, 16, 0, 0).unwrap();

        assert!(store.load(&symbol).await.unwrap().is_none());

        store
            .upsert(&CachedPrice::new(symbol.clone(), 410.2, t0))
            .await
            .unwrap();
        store
            .upsert(&CachedPrice::new(symbol.clone(), 411.0, t0))
            .await
            .unwrap();

        let entry = store.load(&symbol).await.unwrap().unwrap();
        assert_eq!(entry.price, 411.0);
        assert_eq!(entry.observed_at, t0);
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let symbol = Symbol::normalize("NVDA");
        let t0 = Utc.with_ymd_and_hms(2024, 7, 1, 16, 0, 0).unwrap();

        {
            let store = DiskPriceStore::open(dir.path()).unwrap();
            store
                .upsert(&CachedPrice::new(symbol.clone(), 120.0, t0))
                .await
                .unwrap();
        }

        let reopened = DiskPriceStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load(&symbol).await.unwrap().unwrap().price, 120.0);
    }
}
