//! Price oracle: adjusted closes by (ticker, date) over cached full histories.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};

use crate::cache::MemoryCache;
use crate::price_source::PriceSource;

/// Default number of preceding calendar days probed to bridge weekends and holidays.
pub const DEFAULT_PROBE_DAYS: u32 = 4;

/// Default lifetime of a fetched history. Past adjusted closes only change on
/// splits and dividends, so once a day is enough.
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Full adjusted-close history for one ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    closes: BTreeMap<NaiveDate, f64>,
}

impl PriceHistory {
    pub fn new(closes: BTreeMap<NaiveDate, f64>) -> Self {
        Self { closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Close on exactly `date`.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.closes.get(&date).copied()
    }

    /// Close on `date`, else on `date - 1`, ..., `date - probe_days`.
    pub fn probe(&self, date: NaiveDate, probe_days: u32) -> Option<f64> {
        (0..=u64::from(probe_days))
            .filter_map(|offset| date.checked_sub_days(Days::new(offset)))
            .find_map(|day| self.close_on(day))
    }

    /// Most recent close on or before `date`, however old.
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        self.closes
            .range(..=date)
            .next_back()
            .map(|(day, close)| (*day, *close))
    }
}

type HistoryCache = MemoryCache<String, Option<Arc<PriceHistory>>>;

/// Adjusted-close lookups backed by a read-through, per-ticker history cache.
///
/// Each ticker's history is fetched at most once per cache TTL no matter how
/// many legislators or days ask for it. A miss ("no history") is cached the
/// same way so a dead ticker is not re-requested every day of the replay.
pub struct PriceOracle<S> {
    source: S,
    cache: HistoryCache,
    probe_days: u32,
}

impl<S: PriceSource> PriceOracle<S> {
    /// Creates an oracle with the default probe window.
    pub fn new(source: S, cache: HistoryCache) -> Self {
        Self {
            source,
            cache,
            probe_days: DEFAULT_PROBE_DAYS,
        }
    }

    /// Creates an oracle with a fresh cache of the given TTL.
    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self::new(source, MemoryCache::new(ttl))
    }

    pub fn with_probe_days(mut self, probe_days: u32) -> Self {
        self.probe_days = probe_days;
        self
    }

    pub fn probe_days(&self) -> u32 {
        self.probe_days
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of tickers whose history has been requested.
    pub fn cached_tickers(&self) -> usize {
        self.cache.len()
    }

    /// The ticker's full history, fetching it on first use.
    pub async fn history(&self, ticker: &str) -> Option<Arc<PriceHistory>> {
        let key = ticker.trim().to_uppercase();
        self.cache
            .get_or_init(key.clone(), || async {
                match self.source.fetch_history(&key).await {
                    Ok(Some(history)) if !history.is_empty() => Some(Arc::new(history)),
                    Ok(_) => {
                        tracing::warn!("No price history available for {}", key);
                        None
                    }
                    Err(e) => {
                        tracing::warn!("Price history fetch for {} failed: {}", key, e);
                        None
                    }
                }
            })
            .await
    }

    /// Adjusted close for `ticker` on `date`, probing back over the window.
    ///
    /// `None` means the position cannot be valued on this date.
    pub async fn price(&self, ticker: &str, date: NaiveDate) -> Option<f64> {
        self.history(ticker)
            .await?
            .probe(date, self.probe_days)
    }

    /// Latest known close on or before `as_of`, with no window limit.
    pub async fn latest_price(&self, ticker: &str, as_of: NaiveDate) -> Option<f64> {
        self.history(ticker)
            .await?
            .latest_on_or_before(as_of)
            .map(|(_, close)| close)
    }
}
