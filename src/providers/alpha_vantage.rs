//! Alpha Vantage GLOBAL_QUOTE adapter.
//!
//! The free tier is limited to a handful of calls per minute; when the limit
//! is hit the API still answers 200 with a `Note` instead of a quote.

use crate::core::error::QuoteError;
use crate::core::price::QuoteProvider;
use crate::core::symbol::Symbol;
use crate::providers::util::get_text;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str, client: Client) -> Self {
        AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

fn extract_price(symbol: &Symbol, body: &str) -> Result<f64, QuoteError> {
    let malformed =
        |e: serde_json::Error| QuoteError::parse(symbol.as_str(), format!("malformed quote body: {e}"));
    let doc: Value = serde_json::from_str(body).map_err(malformed)?;

    // Soft failures win over whatever else the body carries.
    if let Some(note) = doc.get("Note").and_then(Value::as_str) {
        return Err(QuoteError::RateLimited {
            symbol: symbol.to_string(),
            note: note.to_string(),
        });
    }
    if let Some(message) = doc.get("Error Message").and_then(Value::as_str) {
        return Err(QuoteError::Provider {
            symbol: symbol.to_string(),
            message: message.to_string(),
        });
    }

    let data: GlobalQuoteResponse = serde_json::from_value(doc).map_err(malformed)?;
    let raw = data
        .global_quote
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), "missing Global Quote"))?
        .price
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), "missing price field"))?;

    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), format!("price is not numeric: '{raw}'")))
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "alphavantage"
    }

    #[instrument(name = "AlphaVantagePriceFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_price(&self, symbol: &Symbol) -> Result<f64, QuoteError> {
        let url = format!("{}/query", self.base_url);
        debug!("Requesting global quote from {}", url);

        let body = get_text(
            &self.client,
            &url,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
            symbol,
        )
        .await?;

        extract_price(symbol, &body).inspect_err(|e| {
            if matches!(e, QuoteError::RateLimited { .. }) {
                warn!("Alpha Vantage rate limit reached");
            }
        })
    }
}
