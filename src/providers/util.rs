use crate::core::error::QuoteError;
use crate::core::symbol::Symbol;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "quotekeeper/0.1";

/// Builds the shared HTTP client. `timeout` bounds the whole request.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Sends a GET and returns the body of a 2xx response.
pub async fn get_text(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    symbol: &Symbol,
) -> Result<String, QuoteError> {
    // The URL can carry credentials in its query string.
    let request_error = |source: reqwest::Error| QuoteError::Request {
        symbol: symbol.to_string(),
        source: source.without_url(),
    };

    let url = Url::parse_with_params(url, query).map_err(|e| QuoteError::InvalidUrl {
        symbol: symbol.to_string(),
        reason: e.to_string(),
    })?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(request_error)?;

    let status = response.status();
    debug!(%status, url = %url.path(), "Received response");
    if !status.is_success() {
        return Err(QuoteError::Status {
            symbol: symbol.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(request_error)
}
