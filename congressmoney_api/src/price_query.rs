//! Query builder for the AlphaVantage daily adjusted time series endpoint.

use url::Url;

/// Trait implemented by query builders that serialize themselves onto a URL.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}

/// How much history the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSize {
    /// The latest 100 data points.
    Compact,
    /// The full 20+ year history.
    #[default]
    Full,
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OutputSize::Compact => "compact",
                OutputSize::Full => "full",
            }
        )
    }
}

/// Parameters for `function=TIME_SERIES_DAILY_ADJUSTED`.
#[derive(Debug, Clone)]
pub struct DailyAdjustedQuery {
    pub symbol: String,
    pub output_size: OutputSize,
}

impl DailyAdjustedQuery {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            output_size: OutputSize::default(),
        }
    }

    pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
        self.output_size = output_size;
        self
    }
}

impl Query for DailyAdjustedQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("function", "TIME_SERIES_DAILY_ADJUSTED")
            .append_pair("symbol", &self.symbol)
            .append_pair("outputsize", &self.output_size.to_string());
        url
    }
}
