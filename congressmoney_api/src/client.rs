//! HTTP client for the aggregate senator transaction feed.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{errors::truncate_body, types::Senator, Error};

/// Default location of the Senate Stock Watcher aggregate dump.
pub const DEFAULT_FEED_URL: &str =
    "https://senate-stock-watcher-data.s3-us-west-2.amazonaws.com/aggregate/all_transactions_for_senators.json";

/// HTTP client for the periodic transaction report aggregate feed.
///
/// The feed is a single JSON document listing every senator with their
/// disclosed transactions. It is fetched once per run.
pub struct FeedClient {
    client: reqwest::Client,
    feed_url: String,
}

impl FeedClient {
    /// Creates a new client pointing at the public aggregate dump.
    pub fn new() -> Result<Self, Error> {
        Self::with_url(DEFAULT_FEED_URL)
    }

    /// Creates a new client with a custom feed URL. Used for testing with wiremock.
    pub fn with_url(feed_url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            client,
            feed_url: feed_url.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::ParseFailed(e.to_string())
        })
    }

    /// Fetches every senator record with its raw transactions.
    pub async fn get_senators(&self) -> Result<Vec<Senator>, Error> {
        self.get::<Vec<Senator>>(&self.feed_url).await
    }
}
