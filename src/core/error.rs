//! Error types for quote providers and price stores.

use thiserror::Error;

/// Failure while fetching a quote from an upstream provider.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Request error for symbol {symbol}: {source}")]
    Request {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid request URL for symbol {symbol}: {reason}")]
    InvalidUrl { symbol: String, reason: String },

    #[error("API returned status code {status} for symbol {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("Invalid response format for symbol {symbol}: {reason}")]
    Parse { symbol: String, reason: String },

    #[error("API limit reached for symbol {symbol}: {note}")]
    RateLimited { symbol: String, note: String },

    #[error("API error for symbol {symbol}: {message}")]
    Provider { symbol: String, message: String },
}

impl QuoteError {
    pub fn parse(symbol: &str, reason: impl Into<String>) -> Self {
        QuoteError::Parse {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure in a price store or holdings repository.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keyspace error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
