//! Response types for the AlphaVantage daily adjusted endpoint.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Body of a `TIME_SERIES_DAILY_ADJUSTED` call.
///
/// Successful responses carry `Time Series (Daily)`. Failures are HTTP 200
/// with exactly one of `Error Message` (bad symbol or key), `Note` or
/// `Information` (call budget exhausted).
#[derive(Debug, Clone, Deserialize)]
pub struct DailyAdjustedResponse {
    #[serde(rename = "Meta Data", default)]
    pub meta: Option<DailyMeta>,

    #[serde(rename = "Time Series (Daily)", default)]
    pub time_series: Option<BTreeMap<NaiveDate, DailyBar>>,

    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,

    #[serde(rename = "Note", default)]
    pub note: Option<String>,

    #[serde(rename = "Information", default)]
    pub information: Option<String>,
}

impl DailyAdjustedResponse {
    /// The provider's call-frequency notice, if this response is one.
    pub fn rate_limit_notice(&self) -> Option<&str> {
        if self.time_series.is_some() {
            return None;
        }
        self.note
            .as_deref()
            .or(self.information.as_deref())
            .filter(|msg| {
                let lower = msg.to_lowercase();
                lower.contains("call frequency")
                    || lower.contains("rate limit")
                    || lower.contains("requests per day")
            })
    }

    /// Adjusted closes keyed by trading day, or `None` when the provider had no series.
    pub fn adjusted_closes(&self) -> Option<BTreeMap<NaiveDate, f64>> {
        self.time_series.as_ref().map(|series| {
            series
                .iter()
                .map(|(date, bar)| (*date, bar.adjusted_close))
                .collect()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyMeta {
    #[serde(rename = "2. Symbol")]
    pub symbol: String,

    #[serde(rename = "3. Last Refreshed", default)]
    pub last_refreshed: Option<String>,
}

/// One trading day. AlphaVantage encodes every number as a string.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "4. close", deserialize_with = "f64_from_str")]
    pub close: f64,

    #[serde(rename = "5. adjusted close", deserialize_with = "f64_from_str")]
    pub adjusted_close: f64,

    #[serde(rename = "6. volume", deserialize_with = "f64_from_str", default)]
    pub volume: f64,
}

fn f64_from_str<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse::<f64>().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn information_without_frequency_text_is_not_rate_limit() {
        let resp: DailyAdjustedResponse = serde_json::from_str(
            r#"{"Information": "This is a premium endpoint."}"#,
        )
        .unwrap();
        assert!(resp.rate_limit_notice().is_none());
        assert!(resp.adjusted_closes().is_none());
    }

    #[test]
    fn note_about_call_frequency_is_rate_limit() {
        let resp: DailyAdjustedResponse = serde_json::from_str(
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day."}"#,
        )
        .unwrap();
        assert!(resp.rate_limit_notice().is_some());
    }

    #[test]
    fn non_numeric_close_is_an_error() {
        let result = serde_json::from_str::<DailyBar>(
            r#"{"4. close": "abc", "5. adjusted close": "1.0", "6. volume": "10"}"#,
        );
        assert!(result.is_err());
    }
}
