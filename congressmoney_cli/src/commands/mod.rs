//! CLI subcommand implementations.

pub mod build;
pub mod portfolio;
pub mod summary;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use congressmoney_lib::congressmoney_api::{AlphaVantageClient, FeedClient};
use congressmoney_lib::{
    load_legislators, AlphaVantageSource, ApiSettings, FileFeed, Legislator, PriceOracle,
    RateLimiter, RetryConfig, RunConfig, SenateFeed,
};

/// Loads legislators from a local feed file, or downloads the aggregate feed.
pub async fn fetch_legislators(
    feed_file: Option<&Path>,
    api: &ApiSettings,
) -> Result<Vec<Legislator>> {
    let legislators = match feed_file {
        Some(path) => load_legislators(&FileFeed::new(path)).await?,
        None => {
            let client = match &api.feed_url {
                Some(url) => FeedClient::with_url(url)?,
                None => FeedClient::new()?,
            };
            load_legislators(&SenateFeed::new(client, RetryConfig::from_env())).await?
        }
    };
    if legislators.is_empty() {
        bail!("transaction feed contained no legislators");
    }
    Ok(legislators)
}

/// Builds the shared price oracle from configuration and environment.
pub fn price_oracle(
    config: &RunConfig,
    api: &ApiSettings,
) -> Result<PriceOracle<AlphaVantageSource>> {
    let key = api.require_api_key()?.to_string();
    let client = match &api.price_url {
        Some(base) => AlphaVantageClient::with_base_url(base, key)?,
        None => AlphaVantageClient::new(key)?,
    };
    let source = AlphaVantageSource::new(
        client,
        RateLimiter::per_minute(config.requests_per_minute),
        RetryConfig::from_env(),
    );
    Ok(PriceOracle::with_ttl(source, config.cache_ttl()).with_probe_days(config.probe_days))
}

/// Parses a `YYYY-MM-DD` argument, defaulting to today.
pub fn date_or_today(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw)),
        None => Ok(Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_or_today_parses_iso() {
        assert_eq!(
            date_or_today(Some("2020-01-02")).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_date_or_today_rejects_us_format() {
        let err = date_or_today(Some("01/02/2020")).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_price_oracle_requires_key() {
        let err = price_oracle(&RunConfig::default(), &ApiSettings::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("ALPHAVANTAGE_API_KEY"));
    }

    #[test]
    fn test_price_oracle_uses_config_probe_days() {
        let api = ApiSettings {
            api_key: Some("demo".into()),
            feed_url: None,
            price_url: Some("http://127.0.0.1:9".into()),
        };
        let config = RunConfig {
            probe_days: 2,
            ..RunConfig::default()
        };
        let oracle = price_oracle(&config, &api).unwrap();
        assert_eq!(oracle.probe_days(), 2);
        assert_eq!(oracle.source().limiter().budget(), 5);
    }
}
