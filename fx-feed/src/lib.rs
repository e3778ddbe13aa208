//! # FX Feed
//!
//! HTTP adapter for the public reference rate feed.
//!
//! `GET <base-url>/<BASE>` returns a JSON object whose `rates` member maps
//! currency codes to the price of one `BASE` unit:
//!
//! ```json
//! {"base": "USD", "date": "2026-03-01", "rates": {"EUR": 0.92, "UAH": 41.23}}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use exchange_rates::CurrencyCode;
use fx_types::{FetchError, RateFeed, RateTable};

/// Public feed used when nothing else is configured.
pub const DEFAULT_FEED_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Default bound on one feed request.
pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of a successful feed response. Other members are ignored.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    base: Option<String>,
    rates: RateTable,
}

/// Rate feed backed by an HTTP JSON endpoint.
pub struct HttpRateFeed {
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl HttpRateFeed {
    /// Creates a feed client with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_FEED_TIMEOUT)
    }

    /// Creates a feed client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url_for(&self, base: CurrencyCode) -> String {
        format!("{}/{}", self.base_url, base.code())
    }
}

#[async_trait]
impl RateFeed for HttpRateFeed {
    #[instrument(skip(self), fields(url = %self.url_for(base)))]
    async fn fetch(&self, base: CurrencyCode) -> Result<RateTable, FetchError> {
        let resp = self
            .http
            .get(self.url_for(base))
            .send()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::NetworkFailure(format!("HTTP {}", status)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
        let parsed: LatestRatesResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        match parsed.base.as_deref() {
            Some(quoted) if quoted != base.code() => {
                warn!("Feed quoted against {} instead of {}", quoted, base)
            }
            _ => {}
        }
        debug!("Feed returned {} rates", parsed.rates.len());
        Ok(parsed.rates)
    }
}
