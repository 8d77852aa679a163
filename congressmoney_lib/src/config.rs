//! Run configuration: an optional TOML file plus environment settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CongressMoneyError;
use crate::exclusions::ExclusionSet;
use crate::oracle::DEFAULT_PROBE_DAYS;

pub const API_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";
pub const FEED_URL_VAR: &str = "CONGRESSMONEY_FEED_URL";
pub const PRICE_URL_VAR: &str = "CONGRESSMONEY_PRICE_URL";

/// Tunables for one batch run. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Return series start on Jan 1 of this year.
    pub start_year: i32,
    pub probe_days: u32,
    pub cache_ttl_secs: u64,
    pub top_n: usize,
    /// Minimum purchases + sales for a legislator to count toward the cohort.
    pub min_activity: usize,
    pub benchmark_ticker: String,
    pub recent_limit: usize,
    pub concurrency: usize,
    pub requests_per_minute: u64,
    pub exclusions_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_year: 2020,
            probe_days: DEFAULT_PROBE_DAYS,
            cache_ttl_secs: 60 * 60 * 24,
            top_n: 4,
            min_activity: 1,
            benchmark_ticker: "SPY".to_string(),
            recent_limit: 10,
            concurrency: 4,
            requests_per_minute: 5,
            exclusions_file: None,
        }
    }
}

impl RunConfig {
    pub fn parse(toml_content: &str) -> Result<Self, CongressMoneyError> {
        let config: RunConfig = toml::from_str(toml_content)
            .map_err(|e| CongressMoneyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CongressMoneyError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Loads `path` if given, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CongressMoneyError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), CongressMoneyError> {
        if self.concurrency == 0 {
            return Err(CongressMoneyError::Config("concurrency must be at least 1".into()));
        }
        if self.requests_per_minute == 0 {
            return Err(CongressMoneyError::Config(
                "requests_per_minute must be at least 1".into(),
            ));
        }
        if self.benchmark_ticker.trim().is_empty() {
            return Err(CongressMoneyError::Config("benchmark_ticker is empty".into()));
        }
        self.start_date()?;
        Ok(())
    }

    pub fn start_date(&self) -> Result<NaiveDate, CongressMoneyError> {
        NaiveDate::from_ymd_opt(self.start_year, 1, 1).ok_or_else(|| {
            CongressMoneyError::Config(format!("invalid start_year {}", self.start_year))
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// The configured exclusion file, or the embedded set.
    pub fn exclusions(&self) -> Result<ExclusionSet, CongressMoneyError> {
        let set = match &self.exclusions_file {
            Some(path) => ExclusionSet::from_file(path)?,
            None => ExclusionSet::embedded()?,
        };
        Ok(set)
    }
}

/// Upstream endpoints and credentials, read from the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub feed_url: Option<String>,
    pub price_url: Option<String>,
}

impl ApiSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: env_string(API_KEY_VAR),
            feed_url: env_string(FEED_URL_VAR),
            price_url: env_string(PRICE_URL_VAR),
        }
    }

    pub fn require_api_key(&self) -> Result<&str, CongressMoneyError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| CongressMoneyError::Config(format!("{} is not set", API_KEY_VAR)))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
