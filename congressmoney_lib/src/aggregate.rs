//! Per-legislator evaluation and cohort aggregation into a [`Snapshot`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::RunConfig;
use crate::error::{CongressMoneyError, LedgerError};
use crate::exclusions::ExclusionSet;
use crate::ledger::{portfolio_breakdown, Ledger};
use crate::legislator::{Legislator, LegislatorId};
use crate::normalize::{normalize, Disclosure};
use crate::oracle::PriceOracle;
use crate::price_source::PriceSource;
use crate::returns::{rank_holdings, return_series, top_holdings, Holding};
use crate::snapshot::{
    DailySummary, IgnoredRecord, NameStatus, SenatorName, SenatorSummary, Snapshot,
    TransactionRecord,
};

/// Cohort transaction feed length as a multiple of the per-legislator limit.
const DAILY_FEED_FACTOR: usize = 5;

/// The parts of a run's configuration the aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSettings {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub top_n: usize,
    pub recent_limit: usize,
    pub min_activity: usize,
}

impl AggregateSettings {
    pub fn from_config(config: &RunConfig, end: NaiveDate) -> Result<Self, CongressMoneyError> {
        Ok(Self {
            start: config.start_date()?,
            end,
            top_n: config.top_n,
            recent_limit: config.recent_limit,
            min_activity: config.min_activity,
        })
    }
}

/// One legislator's summary plus every valued transaction, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub summary: SenatorSummary,
    pub transactions: Vec<TransactionRecord>,
}

/// Benchmark series computed alongside the cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct Benchmark {
    pub ticker: String,
    pub returns: BTreeMap<NaiveDate, f64>,
}

/// Normalizes, replays, and values one legislator over the settings' date grid.
pub async fn evaluate_legislator<S: PriceSource>(
    legislator: Legislator,
    oracle: &PriceOracle<S>,
    settings: &AggregateSettings,
) -> Result<Evaluation, LedgerError> {
    let Legislator {
        id,
        name,
        office,
        disclosures,
    } = legislator;

    let disclosures = normalize(&name, disclosures, oracle).await?;
    let ledger = Ledger::new(&disclosures)?;

    let returns = return_series(&ledger, oracle, settings.start, settings.end).await;
    let breakdown = portfolio_breakdown(&ledger, settings.end, oracle).await;
    let top_positions = top_holdings(&breakdown.positions, oracle, settings.end, settings.top_n).await;

    let transactions = valued_transactions(&id, &name, &disclosures);
    let recent_transactions = transactions
        .iter()
        .take(settings.recent_limit)
        .cloned()
        .collect();
    let ignored = ignored_records(&disclosures);
    tracing::debug!(
        "{}: {} valued, {} ignored, {} unaccounted",
        name,
        transactions.len(),
        ignored.len(),
        breakdown.unaccounted.len()
    );

    let summary = SenatorSummary {
        estimated_return: returns.values().next_back().copied().unwrap_or(0.0),
        portfolio_value: breakdown.value,
        total_invested: breakdown.total,
        realized_cash: breakdown.cash,
        sales: breakdown.sales,
        purchases: breakdown.purchases,
        returns,
        positions: breakdown
            .positions
            .into_iter()
            .filter(|(_, shares)| *shares > 0.0)
            .collect(),
        top_positions,
        recent_transactions,
        unaccounted: breakdown.unaccounted,
        ignored,
        id,
        name,
        office,
    };
    tracing::info!("Processed {}!", summary.name);

    Ok(Evaluation {
        summary,
        transactions,
    })
}

/// Estimated disclosures up to any date, newest first, same-day records in
/// disclosure order.
fn valued_transactions(
    id: &LegislatorId,
    name: &str,
    disclosures: &[Disclosure],
) -> Vec<TransactionRecord> {
    let mut records: Vec<TransactionRecord> = disclosures
        .iter()
        .filter_map(|d| {
            let shares = d.estimated_shares()?;
            Some(TransactionRecord {
                senator_id: id.clone(),
                senator: name.to_string(),
                date: d.date?,
                ticker: d.ticker.clone().or_else(|| d.record.ticker.clone())?,
                kind: d.kind_label().to_string(),
                amount: d.record.amount.clone().unwrap_or_default(),
                estimated_shares: shares,
                owner: d.record.owner.clone(),
                asset_description: d.record.asset_description.clone(),
                ptr_link: d.record.ptr_link.clone(),
            })
        })
        .collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));
    records
}

/// Every ignored disclosure with its reason, in disclosure order.
pub fn ignored_records(disclosures: &[Disclosure]) -> Vec<IgnoredRecord> {
    disclosures
        .iter()
        .filter_map(|d| {
            let reason = d.ignored()?;
            Some(IgnoredRecord {
                transaction_date: d.record.transaction_date.clone(),
                ticker: d.record.ticker.clone(),
                kind: d.record.tx_type.clone(),
                amount: d.record.amount.clone(),
                reason,
                ignored: reason.to_string(),
            })
        })
        .collect()
}

/// Cohort status of one legislator.
pub fn name_status(
    summary: &SenatorSummary,
    exclusions: &ExclusionSet,
    min_activity: usize,
) -> NameStatus {
    if let Some(exclusion) = exclusions.get(&summary.id) {
        return NameStatus::Excluded {
            reason: exclusion.reason.clone(),
            duplicate_of: exclusion.duplicate_of.clone(),
        };
    }
    if summary.activity() < min_activity {
        NameStatus::Inactive
    } else {
        NameStatus::Included
    }
}

/// Mean value per date across the given series. A date counts only the
/// series that have a value for it.
pub fn cohort_average<'a, I>(series: I) -> BTreeMap<NaiveDate, f64>
where
    I: IntoIterator<Item = &'a BTreeMap<NaiveDate, f64>>,
{
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for returns in series {
        for (day, value) in returns {
            let entry = sums.entry(*day).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(day, (sum, count))| (day, sum / count as f64))
        .collect()
}

/// Combines holdings by ticker and keeps the `n` most valuable.
pub fn aggregate_holdings<'a, I>(holdings: I, n: usize) -> Vec<Holding>
where
    I: IntoIterator<Item = &'a Holding>,
{
    let mut by_ticker: BTreeMap<&str, Holding> = BTreeMap::new();
    for holding in holdings {
        by_ticker
            .entry(holding.ticker.as_str())
            .and_modify(|combined| {
                combined.shares += holding.shares;
                combined.value += holding.value;
            })
            .or_insert_with(|| holding.clone());
    }
    let mut combined: Vec<Holding> = by_ticker.into_values().collect();
    rank_holdings(&mut combined);
    combined.truncate(n);
    combined
}

/// Latest `limit` transactions across evaluations, newest first. Same-day
/// records order by legislator id, then disclosure order.
pub fn daily_transactions<'a, I>(evaluations: I, limit: usize) -> Vec<TransactionRecord>
where
    I: IntoIterator<Item = &'a Evaluation>,
{
    let mut feed: Vec<TransactionRecord> = evaluations
        .into_iter()
        .flat_map(|e| e.transactions.iter().cloned())
        .collect();
    feed.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.senator_id.cmp(&b.senator_id))
    });
    feed.truncate(limit);
    feed
}

/// Assembles the persisted snapshot from per-legislator evaluations.
///
/// Legislators in the exclusion set appear only in `senator_names`. Inactive
/// legislators keep their entry in `senators` but do not count toward the
/// `daily_summary`.
pub fn build_snapshot(
    mut evaluations: Vec<Evaluation>,
    exclusions: &ExclusionSet,
    benchmark: Benchmark,
    settings: &AggregateSettings,
    generated_at: DateTime<Utc>,
) -> Snapshot {
    evaluations.sort_by(|a, b| a.summary.id.cmp(&b.summary.id));

    let mut senator_names = Vec::with_capacity(evaluations.len());
    let mut included: Vec<&Evaluation> = Vec::new();
    for evaluation in &evaluations {
        let status = name_status(&evaluation.summary, exclusions, settings.min_activity);
        if status == NameStatus::Included {
            included.push(evaluation);
        }
        senator_names.push(SenatorName {
            id: evaluation.summary.id.clone(),
            name: evaluation.summary.name.clone(),
            status,
        });
    }

    let senator_count = included.len();
    let estimated_return = if senator_count == 0 {
        0.0
    } else {
        included
            .iter()
            .map(|e| e.summary.estimated_return)
            .sum::<f64>()
            / senator_count as f64
    };

    let daily_summary = DailySummary {
        estimated_return,
        portfolio_value: included.iter().map(|e| e.summary.portfolio_value).sum(),
        sales: included.iter().map(|e| e.summary.sales).sum(),
        purchases: included.iter().map(|e| e.summary.purchases).sum(),
        average_daily_returns: cohort_average(included.iter().map(|e| &e.summary.returns)),
        top_positions: aggregate_holdings(
            included.iter().flat_map(|e| e.summary.top_positions.iter()),
            settings.top_n,
        ),
        daily_transactions: daily_transactions(
            included.iter().copied(),
            settings.recent_limit * DAILY_FEED_FACTOR,
        ),
        index_returns: benchmark.returns,
        index_ticker: benchmark.ticker,
        senator_count,
    };

    let senators = evaluations
        .into_iter()
        .filter(|e| !exclusions.contains(&e.summary.id))
        .map(|e| (e.summary.id.clone(), e.summary))
        .collect();

    Snapshot {
        generated_at,
        start_date: settings.start,
        end_date: settings.end,
        senators,
        daily_summary,
        senator_names,
    }
}
