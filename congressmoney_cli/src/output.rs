use anyhow::Result;
use congressmoney_lib::ledger::UnaccountedSale;
use congressmoney_lib::snapshot::{NameStatus, SenatorSummary, Snapshot};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
pub struct SummaryRow {
    #[tabled(rename = "Rank")]
    #[serde(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Senator")]
    #[serde(rename = "Senator")]
    name: String,
    #[tabled(rename = "Id")]
    #[serde(rename = "Id")]
    id: String,
    #[tabled(rename = "Return")]
    #[serde(rename = "Return")]
    estimated_return: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
    #[tabled(rename = "Invested")]
    #[serde(rename = "Invested")]
    invested: String,
    #[tabled(rename = "Purchases")]
    #[serde(rename = "Purchases")]
    purchases: usize,
    #[tabled(rename = "Sales")]
    #[serde(rename = "Sales")]
    sales: usize,
    #[tabled(rename = "Unaccounted")]
    #[serde(rename = "Unaccounted")]
    unaccounted: usize,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
pub struct PositionRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Shares")]
    #[serde(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
pub struct UnaccountedRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    kind: String,
    #[tabled(rename = "Amount")]
    #[serde(rename = "Amount")]
    amount: String,
}

// -- Row builders --

/// Ranks every named legislator in the snapshot by latest return.
///
/// Excluded legislators have no summary and are listed only when
/// `include_all` is set, after the ranked rows.
pub fn build_summary_rows(snapshot: &Snapshot, include_all: bool) -> Vec<SummaryRow> {
    let mut ranked: Vec<(&SenatorSummary, &NameStatus)> = snapshot
        .senator_names
        .iter()
        .filter_map(|n| snapshot.senators.get(&n.id).map(|s| (s, &n.status)))
        .filter(|(_, status)| include_all || **status == NameStatus::Included)
        .collect();
    ranked.sort_by(|(a, _), (b, _)| {
        b.estimated_return
            .total_cmp(&a.estimated_return)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut rows: Vec<SummaryRow> = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (s, status))| SummaryRow {
            rank: i + 1,
            name: s.name.clone(),
            id: s.id.to_string(),
            estimated_return: format_return(s.estimated_return),
            value: format_value(s.portfolio_value),
            invested: format_value(s.total_invested),
            purchases: s.purchases,
            sales: s.sales,
            unaccounted: s.unaccounted.len(),
            status: format_status(status),
        })
        .collect();

    if include_all {
        let next_rank = rows.len() + 1;
        rows.extend(
            snapshot
                .senator_names
                .iter()
                .filter(|n| !snapshot.senators.contains_key(&n.id))
                .enumerate()
                .map(|(i, n)| SummaryRow {
                    rank: next_rank + i,
                    name: n.name.clone(),
                    id: n.id.to_string(),
                    estimated_return: String::new(),
                    value: String::new(),
                    invested: String::new(),
                    purchases: 0,
                    sales: 0,
                    unaccounted: 0,
                    status: format_status(&n.status),
                }),
        );
    }
    rows
}

/// One row per open position; `priced` pairs each ticker with its price at the cutoff.
pub fn build_position_rows(priced: &[(String, f64, Option<f64>)]) -> Vec<PositionRow> {
    priced
        .iter()
        .map(|(ticker, shares, price)| PositionRow {
            ticker: ticker.clone(),
            shares: format!("{:.2}", shares),
            price: price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".into()),
            value: price
                .map(|p| format_value(shares * p))
                .unwrap_or_else(|| "-".into()),
        })
        .collect()
}

pub fn build_unaccounted_rows(sales: &[UnaccountedSale]) -> Vec<UnaccountedRow> {
    sales
        .iter()
        .map(|s| UnaccountedRow {
            date: s.date.to_string(),
            ticker: s.ticker.clone(),
            kind: s.kind.clone(),
            amount: format_value(s.amount),
        })
        .collect()
}

// -- Output --

pub fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

pub fn format_value(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

/// Value-to-invested ratio, e.g. `1.125x`.
pub fn format_return(ratio: f64) -> String {
    format!("{:.3}x", ratio)
}

fn format_status(status: &NameStatus) -> String {
    match status {
        NameStatus::Included => "included".into(),
        NameStatus::Inactive => "inactive".into(),
        NameStatus::Excluded {
            duplicate_of: Some(canonical),
            ..
        } => format!("duplicate of {}", canonical),
        NameStatus::Excluded { reason, .. } => format!("excluded: {}", reason),
    }
}
