//! Request pacing and retry for the senator feed and the price provider.
//!
//! AlphaVantage's free tier allows a handful of calls per minute per key, so
//! every upstream call goes through a sliding-window limiter. Call-frequency
//! notices and transient HTTP failures are retried with exponential backoff.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use congressmoney_api::Error;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Calls per minute allowed on the free AlphaVantage tier.
const FREE_TIER_PER_MINUTE: u64 = 5;

/// Sliding-window limiter shared by every task hitting one upstream.
pub struct RateLimiter {
    sent: Mutex<VecDeque<Instant>>,
    budget: u64,
    period: Duration,
    stats: RequestStats,
}

impl RateLimiter {
    pub fn new(budget: u64, period: Duration) -> Self {
        let budget = budget.max(1);
        Self {
            sent: Mutex::new(VecDeque::with_capacity(budget as usize)),
            budget,
            period,
            stats: RequestStats::default(),
        }
    }

    pub fn per_minute(budget: u64) -> Self {
        Self::new(budget, Duration::from_secs(60))
    }

    /// Block until the window has room, then claim a slot.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while sent
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= self.period)
                {
                    sent.pop_front();
                }
                if (sent.len() as u64) < self.budget {
                    sent.push_back(now);
                    return;
                }
                sent.front()
                    .map(|&oldest| (oldest + self.period).duration_since(now))
                    .unwrap_or_default()
            };
            sleep(wait).await;
        }
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn stats(&self) -> &RequestStats {
        &self.stats
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_minute(FREE_TIER_PER_MINUTE)
    }
}

/// Outcome counters, reported once a build finishes.
#[derive(Default)]
pub struct RequestStats {
    ok: AtomicU64,
    throttled: AtomicU64,
    failed: AtomicU64,
    backoff_ms: AtomicU64,
}

impl RequestStats {
    fn record<T>(&self, result: &Result<T, Error>) {
        let counter = match result {
            Ok(_) => &self.ok,
            Err(Error::RateLimited(_)) => &self.throttled,
            Err(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn add_backoff(&self, delay: Duration) {
        self.backoff_ms
            .fetch_add(delay.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn counts(&self) -> RequestCounts {
        RequestCounts {
            ok: self.ok.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            backoff: Duration::from_millis(self.backoff_ms.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestCounts {
    pub ok: u64,
    pub throttled: u64,
    pub failed: u64,
    pub backoff: Duration,
}

impl RequestCounts {
    pub fn total(&self) -> u64 {
        self.ok + self.throttled + self.failed
    }
}

impl fmt::Display for RequestCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests, {} ok, {} throttled, {} failed, {:.1}s backoff",
            self.total(),
            self.ok,
            self.throttled,
            self.failed,
            self.backoff.as_secs_f64()
        )
    }
}

/// Backoff policy for retried requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30000,
        }
    }
}

impl RetryConfig {
    /// Defaults overridden by `CONGRESSMONEY_RETRY_{MAX,BASE_MS,MAX_MS}`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_or("CONGRESSMONEY_RETRY_MAX", defaults.max_retries),
            base_delay_ms: env_or("CONGRESSMONEY_RETRY_BASE_MS", defaults.base_delay_ms),
            max_delay_ms: env_or("CONGRESSMONEY_RETRY_MAX_MS", defaults.max_delay_ms),
        }
    }

    /// `base * 2^(attempt-1)`, capped, with +/-20% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(30));
        let capped = doubled.min(self.max_delay_ms) as f64;
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((capped * jitter) as u64)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Run `operation` behind `limiter`, retrying retryable failures.
///
/// Non-retryable errors return on the first attempt; retryable ones are tried
/// up to `1 + retry.max_retries` times before the last error is returned.
pub async fn with_retry<F, Fut, T>(
    limiter: &RateLimiter,
    retry: &RetryConfig,
    label: &str,
    operation: F,
) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        limiter.acquire().await;
        let result = operation().await;
        limiter.stats.record(&result);

        let err = match result {
            Ok(val) => return Ok(val),
            Err(err) if attempt >= retry.max_retries || !err.is_retryable() => return Err(err),
            Err(err) => err,
        };
        attempt += 1;
        let delay = retry.delay_for_attempt(attempt);
        tracing::warn!(
            "{} failed ({}/{}): {}; retrying in {:.1}s",
            label,
            attempt,
            retry.max_retries,
            err,
            delay.as_secs_f64()
        );
        limiter.stats.add_backoff(delay);
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn quick(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn budget_is_granted_without_waiting() {
        let limiter = RateLimiter::per_minute(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn full_window_blocks_until_oldest_expires() {
        let limiter = Arc::new(RateLimiter::new(3, Duration::from_secs(10)));
        for _ in 0..3 {
            limiter.acquire().await;
        }

        let waiter = Arc::clone(&limiter);
        let handle = tokio::spawn(async move { waiter.acquire().await });

        tokio::time::advance(Duration::from_secs(9)).await;
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        tokio::time::advance(Duration::from_secs(2)).await;
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_call_waits_one_period() {
        let limiter = RateLimiter::new(3, Duration::from_secs(5));
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn default_matches_free_tier() {
        assert_eq!(RateLimiter::default().budget(), 5);
        assert_eq!(RateLimiter::per_minute(0).budget(), 1);
    }

    #[test]
    fn delay_grows_and_caps() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 4000,
        };
        let first = retry.delay_for_attempt(1).as_millis();
        assert!((800..=1200).contains(&first));
        let third = retry.delay_for_attempt(3).as_millis();
        assert!((3200..=4800).contains(&third));
        let capped = retry.delay_for_attempt(10).as_millis();
        assert!((3200..=4800).contains(&capped));
    }

    #[tokio::test]
    async fn success_is_counted_once() {
        let limiter = RateLimiter::per_minute(100);
        let value = with_retry(&limiter, &quick(3), "test", || async { Ok::<_, Error>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let counts = limiter.stats().counts();
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.ok, 1);
        assert_eq!(counts.backoff, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn throttling_is_retried() {
        let limiter = RateLimiter::per_minute(100);
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);

        let value = with_retry(&limiter, &quick(3), "test", move || {
            let seen = Arc::clone(&seen);
            async move {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::RateLimited("slow down".into()))
                } else {
                    Ok(99)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 99);
        let counts = limiter.stats().counts();
        assert_eq!(counts.ok, 1);
        assert_eq!(counts.throttled, 2);
        assert!(counts.backoff > Duration::ZERO);
    }

    #[tokio::test]
    async fn parse_failures_are_not_retried() {
        let limiter = RateLimiter::per_minute(100);
        let result = with_retry(&limiter, &quick(3), "test", || async {
            Err::<i32, _>(Error::ParseFailed("bad".into()))
        })
        .await;

        assert!(matches!(result, Err(Error::ParseFailed(_))));
        let counts = limiter.stats().counts();
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_run_out() {
        let limiter = RateLimiter::per_minute(100);
        let result = with_retry(&limiter, &quick(2), "test", || async {
            Err::<i32, _>(Error::RateLimited("slow down".into()))
        })
        .await;

        assert!(matches!(result, Err(Error::RateLimited(_))));
        assert_eq!(limiter.stats().counts().throttled, 3);
    }

    #[test]
    fn counts_display() {
        let counts = RequestCounts {
            ok: 4,
            throttled: 1,
            failed: 0,
            backoff: Duration::from_millis(2500),
        };
        assert_eq!(
            counts.to_string(),
            "5 requests, 4 ok, 1 throttled, 0 failed, 2.5s backoff"
        );
    }
}
