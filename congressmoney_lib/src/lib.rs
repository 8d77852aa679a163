//! Portfolio reconstruction for congressional stock disclosures.
//!
//! Turns periodic transaction reports (a date, a kind, and a dollar range per
//! trade) plus daily adjusted closes into per-legislator position ledgers,
//! return series, and a cohort benchmark persisted as one JSON snapshot.

pub mod aggregate;
pub mod amount;
pub mod cache;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod feed;
pub mod ledger;
pub mod legislator;
pub mod normalize;
pub mod oracle;
pub mod price_source;
pub mod rate_limiter;
pub mod returns;
pub mod snapshot;

pub use congressmoney_api;
pub use congressmoney_api::types;

pub use aggregate::{build_snapshot, evaluate_legislator, AggregateSettings, Benchmark, Evaluation};
pub use amount::{estimate_amount, AmountRange};
pub use config::{ApiSettings, RunConfig};
pub use error::{CongressMoneyError, LedgerError};
pub use exclusions::ExclusionSet;
pub use feed::{load_legislators, FileFeed, SenateFeed, TransactionFeed};
pub use ledger::{portfolio_breakdown, Breakdown, Ledger};
pub use legislator::{Legislator, LegislatorId};
pub use normalize::{normalize, Disclosure, IgnoreReason, Outcome};
pub use oracle::{PriceHistory, PriceOracle};
pub use price_source::{AlphaVantageSource, PriceSource, StaticPriceSource};
pub use rate_limiter::{RateLimiter, RetryConfig};
pub use returns::{index_series, return_series, top_holdings, Holding, PeriodReturn};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot};
