//! Raw transaction feed providers.

use std::future::Future;
use std::path::PathBuf;

use congressmoney_api::types::Senator;
use congressmoney_api::FeedClient;

use crate::error::CongressMoneyError;
use crate::legislator::{legislators_from_senators, Legislator};
use crate::rate_limiter::{with_retry, RateLimiter, RetryConfig};

/// Source of the per-legislator disclosure records, fetched once per run.
pub trait TransactionFeed: Send + Sync {
    fn fetch_senators(
        &self,
    ) -> impl Future<Output = Result<Vec<Senator>, CongressMoneyError>> + Send;
}

/// The aggregate feed over HTTP, retried on transient failures.
pub struct SenateFeed {
    client: FeedClient,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl SenateFeed {
    pub fn new(client: FeedClient, retry: RetryConfig) -> Self {
        Self {
            client,
            limiter: RateLimiter::per_minute(60),
            retry,
        }
    }
}

impl TransactionFeed for SenateFeed {
    async fn fetch_senators(&self) -> Result<Vec<Senator>, CongressMoneyError> {
        tracing::info!("Loading senator transaction data");
        let senators = with_retry(&self.limiter, &self.retry, "senator feed", || {
            self.client.get_senators()
        })
        .await?;
        Ok(senators)
    }
}

/// A previously downloaded copy of the feed on disk.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TransactionFeed for FileFeed {
    async fn fetch_senators(&self) -> Result<Vec<Senator>, CongressMoneyError> {
        tracing::info!("Loading senator transaction data from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Fetches the feed and groups it into legislators sorted by id.
pub async fn load_legislators<F: TransactionFeed>(
    feed: &F,
) -> Result<Vec<Legislator>, CongressMoneyError> {
    let senators = feed.fetch_senators().await?;
    let legislators = legislators_from_senators(senators);
    tracing::info!("Loaded {} legislators", legislators.len());
    Ok(legislators)
}
