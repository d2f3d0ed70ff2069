use crate::core::error::QuoteError;
use crate::core::price::QuoteProvider;
use crate::core::symbol::Symbol;
use crate::providers::util::get_text;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Chart endpoint quotes. Needs no credential.
pub struct YahooFinanceProvider {
    base_url: String,
    client: Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, client: Client) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

// Every link is optional so a missing one can be reported by name.
#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: Option<PriceChartResult>,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: Option<PriceChartMeta>,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

fn extract_price(symbol: &Symbol, body: &str) -> Result<f64, QuoteError> {
    let data: YahooPriceResponse = serde_json::from_str(body)
        .map_err(|e| QuoteError::parse(symbol.as_str(), format!("malformed chart body: {e}")))?;

    let chart = data
        .chart
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), "missing chart"))?;
    let item = chart
        .result
        .and_then(|items| items.into_iter().next())
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), "missing result array"))?;
    let meta = item
        .meta
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), "missing meta"))?;
    meta.regular_market_price
        .ok_or_else(|| QuoteError::parse(symbol.as_str(), "missing price"))
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(name = "YahooPriceFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_price(&self, symbol: &Symbol) -> Result<f64, QuoteError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting price data from {}", url);

        let body = get_text(
            &self.client,
            &url,
            &[("interval", "1d"), ("range", "1d")],
            symbol,
        )
        .await?;

        let price = extract_price(symbol, &body)?;
        debug!(price, "Parsed Yahoo quote");
        Ok(price)
    }
}
