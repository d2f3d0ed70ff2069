//! Ticker symbols and the live-pricing eligibility rules.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Asset kind that qualifies for live pricing.
pub const STOCK_KIND: &str = "stock";
/// Source tag marking a record as priced from the market feed.
pub const MARKET_SOURCE: &str = "market_api";

const MAX_SYMBOL_LEN: usize = 5;

/// A normalized (trimmed, upper-cased) ticker used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn normalize(raw: &str) -> Self {
        Symbol(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true when the trimmed identifier is 1-5 ASCII uppercase letters.
///
/// Case is not folded here: a lower-case identifier is treated as a name,
/// not a ticker, and is never sent to a provider.
pub fn is_stock_symbol(raw: &str) -> bool {
    let name = raw.trim();
    (1..=MAX_SYMBOL_LEN).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_uppercase())
}

/// Full eligibility gate for a live lookup.
pub fn is_live_priced(asset_kind: &str, symbol: &str, source: &str) -> bool {
    asset_kind == STOCK_KIND && source == MARKET_SOURCE && is_stock_symbol(symbol)
}
