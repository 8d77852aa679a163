//! Daily return series, top holdings, and the benchmark index series.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::{portfolio_breakdown, Ledger};
use crate::oracle::PriceOracle;
use crate::price_source::PriceSource;

/// Return on one day of the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeriodReturn {
    /// Market value divided by cumulative invested dollars.
    Ratio(f64),
    /// Nothing invested yet; carries the raw market value instead of a ratio.
    Uninvested(f64),
}

impl PeriodReturn {
    pub fn new(value: f64, total: f64) -> Self {
        if total > 0.0 {
            PeriodReturn::Ratio(value / total)
        } else {
            PeriodReturn::Uninvested(value)
        }
    }

    /// The number written into the series.
    pub fn value(&self) -> f64 {
        match *self {
            PeriodReturn::Ratio(v) | PeriodReturn::Uninvested(v) => v,
        }
    }

    pub fn is_invested(&self) -> bool {
        matches!(self, PeriodReturn::Ratio(_))
    }
}

/// Every calendar day in `start..=end`.
pub fn date_grid(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// One value per calendar day, replaying the ledger to each day in turn.
pub async fn return_series<S: PriceSource>(
    ledger: &Ledger,
    oracle: &PriceOracle<S>,
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<NaiveDate, f64> {
    let mut series = BTreeMap::new();
    for day in date_grid(start, end) {
        let breakdown = portfolio_breakdown(ledger, day, oracle).await;
        series.insert(day, PeriodReturn::new(breakdown.value, breakdown.total).value());
    }
    series
}

/// A position valued at its latest known close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub shares: f64,
    pub price: f64,
    pub value: f64,
}

/// Largest first; equal values fall back to ticker order.
pub(crate) fn rank_holdings(holdings: &mut [Holding]) {
    holdings.sort_by(|a, b| match b.value.total_cmp(&a.value) {
        Ordering::Equal => a.ticker.cmp(&b.ticker),
        other => other,
    });
}

/// The `n` most valuable open positions as of `as_of`.
///
/// Tickers with no close at all on or before `as_of` are skipped.
pub async fn top_holdings<S: PriceSource>(
    positions: &BTreeMap<String, f64>,
    oracle: &PriceOracle<S>,
    as_of: NaiveDate,
    n: usize,
) -> Vec<Holding> {
    let mut holdings = Vec::new();
    for (ticker, shares) in positions {
        if *shares <= 0.0 {
            continue;
        }
        if let Some(price) = oracle.latest_price(ticker, as_of).await {
            holdings.push(Holding {
                ticker: ticker.clone(),
                shares: *shares,
                price,
                value: shares * price,
            });
        }
    }
    rank_holdings(&mut holdings);
    holdings.truncate(n);
    holdings
}

/// Benchmark growth of one dollar placed in `ticker` at the start of the grid.
///
/// The base is the first price found in the grid. Days before it read 1.0 and
/// days without a price repeat the previous value.
pub async fn index_series<S: PriceSource>(
    oracle: &PriceOracle<S>,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<NaiveDate, f64> {
    let mut series = BTreeMap::new();
    let mut base: Option<f64> = None;
    let mut last = 1.0;
    for day in date_grid(start, end) {
        if let Some(price) = oracle.price(ticker, day).await {
            let base = *base.get_or_insert(price);
            last = price / base;
        }
        series.insert(day, last);
    }
    series
}
