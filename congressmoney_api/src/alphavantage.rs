//! AlphaVantage client for full daily adjusted-close histories.

use std::time::Duration;

use url::Url;

use crate::{
    errors::truncate_body,
    price_query::{DailyAdjustedQuery, Query},
    types::DailyAdjustedResponse,
    Error,
};

/// Request timeout for AlphaVantage calls. Full histories are several MB.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// AlphaVantage REST client.
///
/// A missing or invalid ticker is not an error at this layer: the provider
/// answers HTTP 200 with an `Error Message` body, which deserializes into a
/// response without a time series. Call-frequency notices are surfaced as
/// [`Error::RateLimited`] so callers can back off.
pub struct AlphaVantageClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a client against the production endpoint.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url("https://www.alphavantage.co", api_key)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn query_url(&self, query: &DailyAdjustedQuery) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}/query", self.base_url)).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        let mut url = query.add_to_url(&url);
        url.query_pairs_mut().append_pair("apikey", &self.api_key);
        Ok(url)
    }

    /// Fetch the daily adjusted series for one ticker.
    pub async fn get_daily_adjusted(
        &self,
        query: &DailyAdjustedQuery,
    ) -> Result<DailyAdjustedResponse, Error> {
        let url = self.query_url(query)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to get daily series for {}: {}", query.symbol, e);
            Error::RequestFailed
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: DailyAdjustedResponse = serde_json::from_str(&body).map_err(|e| {
            Error::ParseFailed(format!(
                "Failed to deserialize response: {} | body: {}",
                e,
                truncate_body(&body)
            ))
        })?;

        if let Some(notice) = parsed.rate_limit_notice() {
            return Err(Error::RateLimited(notice.to_string()));
        }

        Ok(parsed)
    }
}
