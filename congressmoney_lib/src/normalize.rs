//! Transaction normalization: cleaning raw disclosure records and
//! estimating share counts.
//!
//! Every record leaves normalization with exactly one terminal outcome:
//! an estimated share count or an ignore reason. Nothing is dropped.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use congressmoney_api::types::{RawTransaction, TxKind, NO_TICKER};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::amount::{estimate_amount, estimate_shares};
use crate::error::LedgerError;
use crate::oracle::PriceOracle;
use crate::price_source::PriceSource;

/// Why a record was excluded from valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NoAmount,
    NoDate,
    UnparseableDate,
    NoTicker,
    NoPrice,
    /// An Exchange row whose acquired side was re-emitted as a Purchase.
    ConvertedExchange,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IgnoreReason::NoAmount => "ignored because no amount was specified in the transaction",
            IgnoreReason::NoDate => "ignored because the transaction was missing a transaction date",
            IgnoreReason::UnparseableDate => "ignored because the transaction date could not be parsed",
            IgnoreReason::NoTicker => "ignored because there was no ticker",
            IgnoreReason::NoPrice => "ignored because no stock price could be retrieved at this point in time",
            IgnoreReason::ConvertedExchange => "ignored because the exchange was converted into a purchase",
        })
    }
}

/// Terminal normalization outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Estimated { shares: f64 },
    Ignored(IgnoreReason),
}

/// A raw record plus what normalization derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    pub record: RawTransaction,
    pub date: Option<NaiveDate>,
    /// Markup-stripped ticker, set once the record reaches the pricing step.
    pub ticker: Option<String>,
    pub outcome: Option<Outcome>,
}

impl Disclosure {
    pub fn from_raw(record: RawTransaction) -> Self {
        Self {
            record,
            date: None,
            ticker: None,
            outcome: None,
        }
    }

    pub fn kind_label(&self) -> &str {
        self.record.tx_type.as_deref().unwrap_or("")
    }

    pub fn kind(&self) -> Option<TxKind> {
        TxKind::parse(self.kind_label())
    }

    pub fn estimated_shares(&self) -> Option<f64> {
        match self.outcome {
            Some(Outcome::Estimated { shares }) => Some(shares),
            _ => None,
        }
    }

    pub fn ignored(&self) -> Option<IgnoreReason> {
        match self.outcome {
            Some(Outcome::Ignored(reason)) => Some(reason),
            _ => None,
        }
    }

    fn ignore(&mut self, reason: IgnoreReason) {
        self.outcome = Some(Outcome::Ignored(reason));
    }
}

fn markup_re() -> Result<&'static Regex, LedgerError> {
    static RE: OnceLock<Result<Regex, String>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^<]+?>").map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| LedgerError::MarkupPattern(e.clone()))
}

/// Removes HTML tags from a ticker cell and trims it.
pub fn strip_markup(ticker: &str) -> Result<String, LedgerError> {
    Ok(markup_re()?.replace_all(ticker, "").trim().to_string())
}

/// Whitespace-separated tickers in a (possibly markup-laden) cell.
pub fn ticker_tokens(ticker: &str) -> Result<Vec<String>, LedgerError> {
    Ok(strip_markup(ticker)?
        .split_whitespace()
        .map(str::to_string)
        .collect())
}

/// Parses the feed's `MM/DD/YYYY` dates, also accepting ISO `YYYY-MM-DD`.
pub fn parse_disclosure_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The Purchase an Exchange row implies for its acquired ticker.
fn synthesize_purchase(exchange: &RawTransaction, acquired: &str) -> Disclosure {
    Disclosure::from_raw(RawTransaction {
        ticker: Some(acquired.to_string()),
        tx_type: Some(TxKind::Purchase.to_string()),
        ..exchange.clone()
    })
}

/// Runs the normalization steps on one record that has no outcome yet.
async fn classify<S: PriceSource>(
    disclosure: &mut Disclosure,
    oracle: &PriceOracle<S>,
    synthesized: &mut Vec<Disclosure>,
) -> Result<(), LedgerError> {
    let Some(amount_label) = non_empty(disclosure.record.amount.as_deref()).map(str::to_string)
    else {
        disclosure.ignore(IgnoreReason::NoAmount);
        return Ok(());
    };

    let Some(raw_date) = non_empty(disclosure.record.transaction_date.as_deref()) else {
        disclosure.ignore(IgnoreReason::NoDate);
        return Ok(());
    };
    let Some(date) = parse_disclosure_date(raw_date) else {
        disclosure.ignore(IgnoreReason::UnparseableDate);
        return Ok(());
    };
    disclosure.date = Some(date);

    if disclosure.kind() == Some(TxKind::Exchange) {
        let tokens = ticker_tokens(disclosure.record.ticker.as_deref().unwrap_or(""))?;
        // A `--` acquired side still converts; the purchase is then ignored as tickerless.
        match tokens.first() {
            Some(acquired) => {
                synthesized.push(synthesize_purchase(&disclosure.record, acquired));
                disclosure.ignore(IgnoreReason::ConvertedExchange);
            }
            None => disclosure.ignore(IgnoreReason::NoTicker),
        }
        return Ok(());
    }

    let ticker = match disclosure.record.ticker.as_deref().map(strip_markup).transpose()? {
        Some(t) if !t.is_empty() && t != NO_TICKER => t,
        _ => {
            disclosure.ignore(IgnoreReason::NoTicker);
            return Ok(());
        }
    };
    disclosure.ticker = Some(ticker.clone());

    let amount = estimate_amount(&amount_label)?;
    let shares = match oracle.price(&ticker, date).await {
        Some(price) => estimate_shares(amount, price),
        None => None,
    };
    match shares {
        Some(shares) => disclosure.outcome = Some(Outcome::Estimated { shares }),
        None => disclosure.ignore(IgnoreReason::NoPrice),
    }
    Ok(())
}

/// Normalizes one legislator's disclosures, returning a new list.
///
/// Records that already carry an outcome pass through untouched. Exchange
/// rows are marked converted and their synthesized purchases are collected
/// in a side buffer, normalized by the same rules, then appended after the
/// original records. Fails on an unknown amount label.
pub async fn normalize<S: PriceSource>(
    legislator: &str,
    disclosures: Vec<Disclosure>,
    oracle: &PriceOracle<S>,
) -> Result<Vec<Disclosure>, LedgerError> {
    let mut out = Vec::with_capacity(disclosures.len());
    let mut synthesized = Vec::new();

    for mut disclosure in disclosures {
        if disclosure.outcome.is_none() {
            classify(&mut disclosure, oracle, &mut synthesized).await?;
            log_ignored(legislator, &disclosure);
        }
        out.push(disclosure);
    }

    let mut unused = Vec::new();
    for mut purchase in synthesized {
        classify(&mut purchase, oracle, &mut unused).await?;
        log_ignored(legislator, &purchase);
        out.push(purchase);
    }

    Ok(out)
}

fn log_ignored(legislator: &str, disclosure: &Disclosure) {
    if let Some(reason) = disclosure.ignored() {
        tracing::debug!(
            "{}: {} {:?} {}",
            legislator,
            disclosure.kind_label(),
            disclosure.record.ticker.as_deref().unwrap_or(""),
            reason
        );
    }
}
