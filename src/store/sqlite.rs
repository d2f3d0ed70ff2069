use crate::core::cache::PriceStore;
use crate::core::error::StoreError;
use crate::core::holdings::{Holding, HoldingsRepository};
use crate::core::price::CachedPrice;
use crate::core::symbol::{MARKET_SOURCE, STOCK_KIND, Symbol};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stock_prices (
    symbol TEXT PRIMARY KEY NOT NULL,
    price REAL NOT NULL,
    last_updated TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    source TEXT NOT NULL,
    current_value REAL NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assets_market ON assets (type, source, name);
";

/// Shared SQLite handle. Statements run on the blocking pool.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // Before the first pragma, which may contend with another process.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL lets readers in other processes proceed while one process writes.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        debug!(path = %path.display(), "Opened price database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&*conn)
        })
        .await?;
        Ok(result?)
    }
}

/// Durable price tier: one row per symbol, last writer wins.
#[derive(Clone)]
pub struct SqlitePriceStore {
    db: SqliteDatabase,
}

impl SqlitePriceStore {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PriceStore for SqlitePriceStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load(&self, symbol: &Symbol) -> Result<Option<CachedPrice>, StoreError> {
        let key = symbol.clone();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT price, last_updated FROM stock_prices WHERE symbol = ?1",
                    params![key.as_str()],
                    |row| {
                        let price: f64 = row.get(0)?;
                        let observed_at: DateTime<Utc> = row.get(1)?;
                        Ok(CachedPrice::new(key.clone(), price, observed_at))
                    },
                )
                .optional()
            })
            .await
    }

    async fn upsert(&self, entry: &CachedPrice) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO stock_prices (symbol, price, last_updated, created_at)
                     VALUES (?1, ?2, ?3, ?3)
                     ON CONFLICT(symbol) DO UPDATE SET
                        price = excluded.price,
                        last_updated = excluded.last_updated",
                    params![entry.symbol.as_str(), entry.price, entry.observed_at],
                )
            })
            .await?;
        Ok(())
    }
}

/// Asset records stored next to the price table.
#[derive(Clone)]
pub struct SqliteHoldings {
    db: SqliteDatabase,
}

impl SqliteHoldings {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    pub async fn add_holding(
        &self,
        name: &str,
        asset_kind: &str,
        source: &str,
        current_value: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let (name, asset_kind, source) =
            (name.to_string(), asset_kind.to_string(), source.to_string());
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO assets (name, type, source, current_value, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![name, asset_kind, source, current_value, updated_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    pub async fn get_holding(&self, id: i64) -> Result<Option<Holding>, StoreError> {
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, name, type, source, current_value, updated_at
                     FROM assets WHERE id = ?1",
                    params![id],
                    holding_from_row,
                )
                .optional()
            })
            .await
    }
}

fn holding_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Holding> {
    Ok(Holding {
        id: row.get(0)?,
        name: row.get(1)?,
        asset_kind: row.get(2)?,
        source: row.get(3)?,
        current_value: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[async_trait]
impl HoldingsRepository for SqliteHoldings {
    async fn update_market_price(
        &self,
        symbol: &Symbol,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let key = symbol.clone();
        let rows = self
            .db
            .call(move |conn| {
                conn.execute(
                    "UPDATE assets SET current_value = ?1, updated_at = ?2
                     WHERE TRIM(name) = ?3 AND type = ?4 AND source = ?5",
                    params![price, at, key.as_str(), STOCK_KIND, MARKET_SOURCE],
                )
            })
            .await?;
        Ok(rows as u64)
    }

    async fn list_market_holdings(&self) -> Result<Vec<Holding>, StoreError> {
        self.db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, type, source, current_value, updated_at
                     FROM assets WHERE type = ?1 AND source = ?2 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![STOCK_KIND, MARKET_SOURCE], holding_from_row)?;
                rows.collect()
            })
            .await
    }
}
