//! The persisted aggregate snapshot read by the presentation layer.
//!
//! Maps are `BTreeMap`s so the written JSON has sorted keys and identical
//! input produces byte-identical output apart from `generated_at`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CongressMoneyError;
use crate::ledger::UnaccountedSale;
use crate::legislator::LegislatorId;
use crate::normalize::IgnoreReason;
use crate::returns::Holding;

/// Default output file name.
pub const DEFAULT_SNAPSHOT_FILE: &str = "processed_senators.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub senators: BTreeMap<LegislatorId, SenatorSummary>,
    pub daily_summary: DailySummary,
    pub senator_names: Vec<SenatorName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenatorSummary {
    pub id: LegislatorId,
    pub name: String,
    pub office: Option<String>,
    /// Last value of `returns`.
    pub estimated_return: f64,
    pub portfolio_value: f64,
    pub total_invested: f64,
    pub realized_cash: f64,
    pub sales: usize,
    pub purchases: usize,
    pub returns: BTreeMap<NaiveDate, f64>,
    /// Open positions at the end date, zero-share tickers omitted.
    pub positions: BTreeMap<String, f64>,
    pub top_positions: Vec<Holding>,
    pub recent_transactions: Vec<TransactionRecord>,
    pub unaccounted: Vec<UnaccountedSale>,
    pub ignored: Vec<IgnoredRecord>,
}

impl SenatorSummary {
    pub fn activity(&self) -> usize {
        self.purchases + self.sales
    }
}

/// A valued disclosure as shown in transaction feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub senator_id: LegislatorId,
    pub senator: String,
    pub date: NaiveDate,
    pub ticker: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
    pub estimated_shares: f64,
    pub owner: Option<String>,
    pub asset_description: Option<String>,
    pub ptr_link: Option<String>,
}

/// A disclosure excluded from valuation, kept for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoredRecord {
    pub transaction_date: Option<String>,
    pub ticker: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<String>,
    pub reason: IgnoreReason,
    /// Human-readable form of `reason`.
    pub ignored: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Mean latest return across included legislators.
    pub estimated_return: f64,
    /// Combined value of included portfolios.
    pub portfolio_value: f64,
    pub sales: usize,
    pub purchases: usize,
    pub average_daily_returns: BTreeMap<NaiveDate, f64>,
    pub top_positions: Vec<Holding>,
    pub daily_transactions: Vec<TransactionRecord>,
    pub index_returns: BTreeMap<NaiveDate, f64>,
    pub index_ticker: String,
    pub senator_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenatorName {
    pub id: LegislatorId,
    pub name: String,
    #[serde(flatten)]
    pub status: NameStatus,
}

/// Whether a legislator counts toward the cohort figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NameStatus {
    Included,
    /// Below the activity threshold.
    Inactive,
    Excluded {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duplicate_of: Option<LegislatorId>,
    },
}

/// Writes the snapshot as pretty JSON via a temp file and rename.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), CongressMoneyError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| DEFAULT_SNAPSHOT_FILE.into());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, json)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    tracing::info!("Wrote snapshot to {}", path.display());
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot, CongressMoneyError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
