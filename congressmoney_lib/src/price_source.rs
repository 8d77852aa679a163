//! Upstream price history providers.
//!
//! [`PriceSource`] is the seam between the oracle and the network. The
//! production implementation wraps the AlphaVantage client with rate
//! limiting and retries; tests substitute an in-memory map.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use congressmoney_api::{AlphaVantageClient, DailyAdjustedQuery};

use crate::oracle::PriceHistory;
use crate::rate_limiter::{with_retry, RateLimiter, RetryConfig};

/// Provider of full daily adjusted-close histories.
///
/// `Ok(None)` means the provider answered but has no series for the ticker.
pub trait PriceSource: Send + Sync + 'static {
    fn fetch_history(
        &self,
        ticker: &str,
    ) -> impl Future<Output = Result<Option<PriceHistory>, congressmoney_api::Error>> + Send;
}

/// AlphaVantage-backed price source.
pub struct AlphaVantageSource {
    client: AlphaVantageClient,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl AlphaVantageSource {
    pub fn new(client: AlphaVantageClient, limiter: RateLimiter, retry: RetryConfig) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

impl PriceSource for AlphaVantageSource {
    async fn fetch_history(
        &self,
        ticker: &str,
    ) -> Result<Option<PriceHistory>, congressmoney_api::Error> {
        let query = DailyAdjustedQuery::new(ticker);
        tracing::info!("Stock data for {} not loaded yet, fetching", query.symbol);
        let response = with_retry(&self.limiter, &self.retry, "daily adjusted", || {
            self.client.get_daily_adjusted(&query)
        })
        .await?;

        match response.adjusted_closes() {
            Some(closes) => Ok(Some(PriceHistory::new(closes))),
            None => {
                tracing::warn!(
                    "{} is invalid: {}",
                    query.symbol,
                    response
                        .error_message
                        .as_deref()
                        .or(response.information.as_deref())
                        .unwrap_or("no time series in response")
                );
                Ok(None)
            }
        }
    }
}

/// Fixed in-memory histories. Counts fetches so callers can assert caching.
#[derive(Default)]
pub struct StaticPriceSource {
    histories: HashMap<String, BTreeMap<NaiveDate, f64>>,
    fetches: AtomicUsize,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one close for `ticker`.
    pub fn with_price(mut self, ticker: &str, date: NaiveDate, close: f64) -> Self {
        self.histories
            .entry(ticker.to_string())
            .or_default()
            .insert(date, close);
        self
    }

    /// Adds the same close for every day in `from..=to`, weekends included.
    pub fn with_flat_price(mut self, ticker: &str, from: NaiveDate, to: NaiveDate, close: f64) -> Self {
        let series = self.histories.entry(ticker.to_string()).or_default();
        for day in from.iter_days().take_while(|d| *d <= to) {
            series.insert(day, close);
        }
        self
    }

    /// Number of `fetch_history` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PriceSource for StaticPriceSource {
    async fn fetch_history(
        &self,
        ticker: &str,
    ) -> Result<Option<PriceHistory>, congressmoney_api::Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .histories
            .get(ticker)
            .map(|closes| PriceHistory::new(closes.clone())))
    }
}
