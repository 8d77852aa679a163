//! Portfolio ledger: chronological replay of estimated disclosures.
//!
//! The ledger is rebuilt from the normalized disclosures for every query and
//! holds no state between cutoffs. Replaying the same ledger to the same
//! cutoff always yields the same positions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use congressmoney_api::types::TxKind;
use serde::{Deserialize, Serialize};

use crate::amount::estimate_amount;
use crate::error::LedgerError;
use crate::normalize::{parse_disclosure_date, ticker_tokens, Disclosure};
use crate::oracle::PriceOracle;
use crate::price_source::PriceSource;

/// One estimated disclosure, ready for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub kind: TxKind,
    /// For Exchange entries, the side being given up.
    pub ticker: String,
    pub shares: f64,
    pub amount: f64,
    /// Position in the disclosure list the ledger was built from.
    pub seq: usize,
}

/// A sale that referenced a ticker with no tracked position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaccountedSale {
    pub date: NaiveDate,
    pub ticker: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub shares: f64,
    pub amount: f64,
}

impl UnaccountedSale {
    fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            date: entry.date,
            ticker: entry.ticker.clone(),
            kind: entry.kind.to_string(),
            shares: entry.shares,
            amount: entry.amount,
        }
    }
}

/// State after replaying the ledger to a cutoff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replay {
    /// Shares per ticker. A ticker stays present at zero once fully sold.
    pub positions: BTreeMap<String, f64>,
    /// Cumulative dollars invested.
    pub total: f64,
    /// Cumulative dollars realized from reconciled sales.
    pub cash: f64,
    pub purchases: usize,
    pub sales: usize,
    pub unaccounted: Vec<UnaccountedSale>,
}

/// A replay plus the market value of its open positions at the cutoff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdown {
    pub positions: BTreeMap<String, f64>,
    pub total: f64,
    pub cash: f64,
    /// Sum of priced positions plus realized cash.
    pub value: f64,
    pub purchases: usize,
    pub sales: usize,
    pub unaccounted: Vec<UnaccountedSale>,
}

/// A legislator's estimated disclosures in replay order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Builds a ledger from normalized disclosures.
    ///
    /// Only `Estimated` records are kept. Entries are stable-sorted by date so
    /// same-day records replay in disclosure order. Kind and amount labels are
    /// checked here, so a schema change fails before any replay runs.
    pub fn new(disclosures: &[Disclosure]) -> Result<Self, LedgerError> {
        let mut entries = Vec::new();
        for (seq, disclosure) in disclosures.iter().enumerate() {
            let Some(shares) = disclosure.estimated_shares() else {
                continue;
            };
            let label = disclosure.kind_label();
            let kind = TxKind::parse(label)
                .ok_or_else(|| LedgerError::UnknownTransactionKind(label.to_string()))?;
            let amount = estimate_amount(disclosure.record.amount.as_deref().unwrap_or(""))?;

            let date = disclosure.date.or_else(|| {
                disclosure
                    .record
                    .transaction_date
                    .as_deref()
                    .and_then(parse_disclosure_date)
            });
            let Some(date) = date else {
                tracing::debug!("Skipping estimated record without a date: {:?}", disclosure.record);
                continue;
            };

            let ticker = match kind {
                TxKind::Exchange => {
                    let tokens = ticker_tokens(disclosure.record.ticker.as_deref().unwrap_or(""))?;
                    match tokens.get(1).or_else(|| tokens.first()) {
                        Some(sold) => sold.clone(),
                        None => continue,
                    }
                }
                _ => match &disclosure.ticker {
                    Some(ticker) => ticker.clone(),
                    None => continue,
                },
            };

            entries.push(LedgerEntry {
                date,
                kind,
                ticker,
                shares,
                amount,
                seq,
            });
        }
        entries.sort_by_key(|entry| entry.date);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|entry| entry.date)
    }

    /// Replays every entry dated on or before `cutoff`.
    pub fn replay(&self, cutoff: NaiveDate) -> Replay {
        let mut state = Replay::default();
        for entry in self.entries.iter().take_while(|entry| entry.date <= cutoff) {
            match entry.kind {
                TxKind::Purchase => {
                    *state.positions.entry(entry.ticker.clone()).or_insert(0.0) += entry.shares;
                    state.total += entry.amount;
                    state.purchases += 1;
                }
                TxKind::SaleFull => match state.positions.get_mut(&entry.ticker) {
                    Some(held) => {
                        *held = 0.0;
                        state.cash += entry.amount;
                        state.sales += 1;
                    }
                    None => state.unaccounted.push(UnaccountedSale::from_entry(entry)),
                },
                TxKind::SalePartial => match state.positions.get_mut(&entry.ticker) {
                    Some(held) => {
                        *held = (*held - entry.shares).max(0.0);
                        state.cash += entry.amount;
                        state.sales += 1;
                    }
                    None => state.unaccounted.push(UnaccountedSale::from_entry(entry)),
                },
                TxKind::Exchange => {
                    if let Some(held) = state.positions.get_mut(&entry.ticker) {
                        *held += entry.shares;
                        state.total += entry.amount;
                    }
                }
            }
        }
        state
    }
}

/// Replays `ledger` to `cutoff` and values the open positions.
///
/// Tickers with no price in the oracle's probe window are left out of the
/// value rather than counted as zero.
pub async fn portfolio_breakdown<S: PriceSource>(
    ledger: &Ledger,
    cutoff: NaiveDate,
    oracle: &PriceOracle<S>,
) -> Breakdown {
    let replay = ledger.replay(cutoff);
    let mut value = replay.cash;
    for (ticker, shares) in &replay.positions {
        if *shares <= 0.0 {
            continue;
        }
        if let Some(price) = oracle.price(ticker, cutoff).await {
            value += shares * price;
        }
    }
    Breakdown {
        positions: replay.positions,
        total: replay.total,
        cash: replay.cash,
        value,
        purchases: replay.purchases,
        sales: replay.sales,
        unaccounted: replay.unaccounted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, Outcome};
    use crate::oracle::DEFAULT_HISTORY_TTL;
    use crate::price_source::StaticPriceSource;
    use congressmoney_api::types::RawTransaction;

    const EPSILON: f64 = 0.0001;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw(kind: &str, ticker: &str, amount: &str, when: &str) -> RawTransaction {
        RawTransaction {
            transaction_date: Some(when.to_string()),
            ticker: Some(ticker.to_string()),
            tx_type: Some(kind.to_string()),
            amount: Some(amount.to_string()),
            ..Default::default()
        }
    }

    fn estimated(kind: &str, ticker: &str, amount: &str, when: NaiveDate, shares: f64) -> Disclosure {
        Disclosure {
            record: raw(kind, ticker, amount, &when.format("%m/%d/%Y").to_string()),
            date: Some(when),
            ticker: Some(ticker.to_string()),
            outcome: Some(Outcome::Estimated { shares }),
        }
    }

    fn oracle() -> PriceOracle<StaticPriceSource> {
        let source = StaticPriceSource::new()
            .with_flat_price("AAPL", date(2020, 1, 1), date(2020, 12, 31), 80.0)
            .with_flat_price("MSFT", date(2020, 1, 1), date(2020, 12, 31), 160.0);
        PriceOracle::with_ttl(source, DEFAULT_HISTORY_TTL)
    }

    const SMALL: &str = "$1,001 - $15,000";

    #[tokio::test]
    async fn scenario_single_purchase() {
        let oracle = oracle();
        let disclosures = normalize(
            "test",
            vec![Disclosure::from_raw(raw("Purchase", "AAPL", SMALL, "01/02/2020"))],
            &oracle,
        )
        .await
        .unwrap();
        let ledger = Ledger::new(&disclosures).unwrap();
        let breakdown = portfolio_breakdown(&ledger, date(2020, 1, 2), &oracle).await;

        let shares = 8000.5 / 80.0;
        assert!((breakdown.positions["AAPL"] - shares).abs() < EPSILON);
        assert!((breakdown.total - 8000.5).abs() < EPSILON);
        assert!((breakdown.value - shares * 80.0).abs() < EPSILON);
        assert_eq!(breakdown.purchases, 1);
        assert!(breakdown.unaccounted.is_empty());
    }

    #[tokio::test]
    async fn scenario_unreconciled_full_sale() {
        let disclosures = vec![
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 100.0),
            estimated("Sale (Full)", "MSFT", SMALL, date(2020, 1, 3), 50.0),
        ];
        let ledger = Ledger::new(&disclosures).unwrap();
        let replay = ledger.replay(date(2020, 1, 10));

        assert_eq!(replay.unaccounted.len(), 1);
        assert_eq!(replay.unaccounted[0].ticker, "MSFT");
        assert_eq!(replay.unaccounted[0].kind, "Sale (Full)");
        assert_eq!(replay.positions.len(), 1);
        assert!((replay.positions["AAPL"] - 100.0).abs() < EPSILON);
        assert_eq!(replay.sales, 0);
        assert!(replay.cash.abs() < EPSILON);
    }

    #[tokio::test]
    async fn scenario_exchange_becomes_purchase() {
        let oracle = oracle();
        let disclosures = normalize(
            "test",
            vec![Disclosure::from_raw(raw(
                "Exchange",
                "<a>AAPL</a> <a>MSFT</a>",
                SMALL,
                "01/02/2020",
            ))],
            &oracle,
        )
        .await
        .unwrap();
        assert_eq!(disclosures.len(), 2);
        assert!(disclosures[0].ignored().is_some());

        let ledger = Ledger::new(&disclosures).unwrap();
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].kind, TxKind::Purchase);

        let breakdown = portfolio_breakdown(&ledger, date(2020, 1, 2), &oracle).await;
        assert!((breakdown.positions["AAPL"] - 8000.5 / 80.0).abs() < EPSILON);
        assert!(!breakdown.positions.contains_key("MSFT"));
    }

    #[test]
    fn partial_sale_clamps_at_zero() {
        let disclosures = vec![
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 10.0),
            estimated("Sale (Partial)", "AAPL", SMALL, date(2020, 1, 3), 25.0),
            estimated("Sale (Partial)", "AAPL", SMALL, date(2020, 1, 4), 5.0),
        ];
        let replay = Ledger::new(&disclosures).unwrap().replay(date(2020, 1, 31));

        assert_eq!(replay.positions["AAPL"], 0.0);
        assert_eq!(replay.sales, 2);
        assert!((replay.cash - 2.0 * 8000.5).abs() < EPSILON);
        // realized cash does not reduce invested total
        assert!((replay.total - 8000.5).abs() < EPSILON);
        assert!(replay.unaccounted.is_empty());
    }

    #[test]
    fn full_sale_then_repurchase() {
        let disclosures = vec![
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 10.0),
            estimated("Sale (Full)", "AAPL", SMALL, date(2020, 2, 3), 10.0),
            estimated("Sale (Full)", "AAPL", SMALL, date(2020, 2, 4), 10.0),
            estimated("Purchase", "AAPL", SMALL, date(2020, 3, 2), 4.0),
        ];
        let ledger = Ledger::new(&disclosures).unwrap();

        let after_sale = ledger.replay(date(2020, 2, 4));
        assert_eq!(after_sale.positions["AAPL"], 0.0);
        // the second full sale reconciles against the known zero position
        assert_eq!(after_sale.sales, 2);
        assert!(after_sale.unaccounted.is_empty());

        let later = ledger.replay(date(2020, 3, 2));
        assert!((later.positions["AAPL"] - 4.0).abs() < EPSILON);
    }

    #[test]
    fn replay_sorts_by_date_and_keeps_disclosure_order_on_ties() {
        let disclosures = vec![
            estimated("Sale (Partial)", "AAPL", SMALL, date(2020, 1, 5), 3.0),
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 10.0),
            estimated("Sale (Full)", "MSFT", SMALL, date(2020, 1, 5), 1.0),
            estimated("Purchase", "MSFT", SMALL, date(2020, 1, 5), 2.0),
        ];
        let ledger = Ledger::new(&disclosures).unwrap();
        let seqs: Vec<_> = ledger.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 0, 2, 3]);

        let replay = ledger.replay(date(2020, 1, 5));
        assert!((replay.positions["AAPL"] - 7.0).abs() < EPSILON);
        // the MSFT sale precedes its purchase in disclosure order
        assert_eq!(replay.unaccounted.len(), 1);
        assert!((replay.positions["MSFT"] - 2.0).abs() < EPSILON);
    }

    #[test]
    fn replay_is_deterministic_and_invested_total_is_monotone() {
        let disclosures = vec![
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 10.0),
            estimated("Sale (Partial)", "AAPL", SMALL, date(2020, 2, 2), 4.0),
            estimated("Purchase", "MSFT", "$15,001 - $50,000", date(2020, 3, 2), 3.0),
            estimated("Sale (Full)", "MSFT", SMALL, date(2020, 4, 2), 3.0),
        ];
        let ledger = Ledger::new(&disclosures).unwrap();

        let mut previous = 0.0;
        let mut day = date(2020, 1, 1);
        while day <= date(2020, 5, 1) {
            let first = ledger.replay(day);
            assert_eq!(first, ledger.replay(day));
            assert!(first.total >= previous);
            assert!(first.positions.values().all(|shares| *shares >= 0.0));
            previous = first.total;
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn cutoff_excludes_later_records() {
        let disclosures = vec![
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 10.0),
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 3), 10.0),
        ];
        let ledger = Ledger::new(&disclosures).unwrap();
        assert!(ledger.replay(date(2020, 1, 1)).positions.is_empty());
        assert!((ledger.replay(date(2020, 1, 2)).positions["AAPL"] - 10.0).abs() < EPSILON);
    }

    #[test]
    fn exchange_adds_to_known_sold_side() {
        let mut exchange = estimated("Exchange", "AAPL MSFT", SMALL, date(2020, 1, 3), 5.0);
        exchange.ticker = None;
        let disclosures = vec![
            estimated("Purchase", "MSFT", SMALL, date(2020, 1, 2), 10.0),
            exchange.clone(),
        ];
        let replay = Ledger::new(&disclosures).unwrap().replay(date(2020, 1, 3));
        assert!((replay.positions["MSFT"] - 15.0).abs() < EPSILON);
        assert!((replay.total - 2.0 * 8000.5).abs() < EPSILON);

        // no known position on the sold side: no effect
        let replay = Ledger::new(&[exchange]).unwrap().replay(date(2020, 1, 3));
        assert!(replay.positions.is_empty());
        assert_eq!(replay.total, 0.0);
        assert!(replay.unaccounted.is_empty());
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let disclosures = vec![estimated("Gift", "AAPL", SMALL, date(2020, 1, 2), 1.0)];
        assert_eq!(
            Ledger::new(&disclosures).unwrap_err(),
            LedgerError::UnknownTransactionKind("Gift".into())
        );
    }

    #[test]
    fn ignored_records_are_skipped() {
        let mut ignored = Disclosure::from_raw(raw("Gift", "AAPL", SMALL, "01/02/2020"));
        ignored.outcome = Some(Outcome::Ignored(crate::normalize::IgnoreReason::NoPrice));
        let ledger = Ledger::new(&[ignored]).unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn unpriced_positions_are_left_out_of_value() {
        let disclosures = vec![
            estimated("Purchase", "AAPL", SMALL, date(2020, 1, 2), 10.0),
            estimated("Purchase", "ZZZZ", SMALL, date(2020, 1, 2), 10.0),
        ];
        let ledger = Ledger::new(&disclosures).unwrap();
        let breakdown = portfolio_breakdown(&ledger, date(2020, 1, 2), &oracle()).await;
        assert!((breakdown.value - 800.0).abs() < EPSILON);
        assert_eq!(breakdown.positions.len(), 2);
    }
}
