mod alphavantage;
mod client;
mod errors;
mod price_query;
pub mod types;
pub use self::alphavantage::AlphaVantageClient;
pub use self::client::FeedClient;
pub use self::errors::Error;
pub use self::price_query::{DailyAdjustedQuery, OutputSize, Query};
