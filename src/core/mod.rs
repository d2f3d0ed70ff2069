//! Core price resolution abstractions

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod holdings;
pub mod log;
pub mod price;
pub mod resolver;
pub mod symbol;

// Re-export main types for cleaner imports
pub use cache::{FreshnessCache, PriceStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{QuoteError, StoreError};
pub use holdings::{Holding, HoldingsRepository, NoHoldings};
pub use price::{CachedPrice, PriceQuery, QuoteProvider, ResolutionOutcome};
pub use resolver::PriceResolver;
pub use symbol::Symbol;
