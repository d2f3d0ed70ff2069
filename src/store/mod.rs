pub mod disk;
pub mod memory;
pub mod sqlite;

use crate::core::cache::PriceStore;
use crate::core::config::{AppConfig, DurableBackend};
use crate::core::holdings::{HoldingsRepository, NoHoldings};
use anyhow::{Context, Result};
use disk::DiskPriceStore;
use memory::MemoryPriceStore;
use sqlite::{SqliteDatabase, SqliteHoldings, SqlitePriceStore};
use std::sync::Arc;
use tracing::debug;

pub const SQLITE_FILE: &str = "quotekeeper.db";
pub const FJALL_DIR: &str = "prices";

/// Storage wired from configuration: cache tiers (fastest first), the
/// durable tier on its own for inspection, and the holdings repository.
pub struct Storage {
    pub tiers: Vec<Arc<dyn PriceStore>>,
    pub durable: Option<Arc<dyn PriceStore>>,
    pub holdings: Arc<dyn HoldingsRepository>,
}

impl Storage {
    pub fn open(config: &AppConfig) -> Result<Self> {
        let mut tiers: Vec<Arc<dyn PriceStore>> = Vec::new();
        if config.cache.memory {
            tiers.push(Arc::new(MemoryPriceStore::new()));
        }

        let mut holdings: Arc<dyn HoldingsRepository> = Arc::new(NoHoldings);
        let durable: Option<Arc<dyn PriceStore>> = match config.cache.durable {
            DurableBackend::Sqlite => {
                let path = config.default_data_path()?.join(SQLITE_FILE);
                let db = SqliteDatabase::open(&path)
                    .with_context(|| format!("Failed to open database: {}", path.display()))?;
                holdings = Arc::new(SqliteHoldings::new(db.clone()));
                Some(Arc::new(SqlitePriceStore::new(db)))
            }
            DurableBackend::Fjall => {
                let path = config.default_data_path()?.join(FJALL_DIR);
                let store = DiskPriceStore::open(&path)
                    .with_context(|| format!("Failed to open keyspace: {}", path.display()))?;
                Some(Arc::new(store))
            }
            DurableBackend::None => None,
        };

        if let Some(store) = &durable {
            tiers.push(Arc::clone(store));
        }
        debug!(
            tiers = ?tiers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "Configured price cache tiers"
        );

        Ok(Self {
            tiers,
            durable,
            holdings,
        })
    }
}
