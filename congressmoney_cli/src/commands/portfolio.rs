//! The `portfolio` subcommand: one legislator's ledger replayed to a date.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::Args;
use congressmoney_lib::aggregate::ignored_records;
use congressmoney_lib::ledger::UnaccountedSale;
use congressmoney_lib::snapshot::IgnoredRecord;
use congressmoney_lib::{
    normalize, portfolio_breakdown, top_holdings, ApiSettings, Holding, Ledger, LegislatorId,
    PeriodReturn, RunConfig,
};
use serde::Serialize;

use super::{date_or_today, fetch_legislators, price_oracle};
use crate::output::{build_position_rows, build_unaccounted_rows, print_json, print_rows, OutputFormat};

#[derive(Args)]
pub struct PortfolioArgs {
    /// Legislator id, e.g. smith-jane
    #[arg(long)]
    pub senator: String,

    /// Cutoff date, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,

    /// Read the transaction feed from a local JSON file instead of downloading it
    #[arg(long)]
    pub feed_file: Option<PathBuf>,

    /// Also list disclosures that were ignored and why
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Serialize)]
struct PortfolioReport {
    id: LegislatorId,
    name: String,
    date: NaiveDate,
    total_invested: f64,
    realized_cash: f64,
    portfolio_value: f64,
    estimated_return: f64,
    purchases: usize,
    sales: usize,
    positions: Vec<PricedPosition>,
    top_positions: Vec<Holding>,
    unaccounted: Vec<UnaccountedSale>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ignored: Vec<IgnoredRecord>,
}

#[derive(Serialize)]
struct PricedPosition {
    ticker: String,
    shares: f64,
    price: Option<f64>,
}

pub async fn run(args: &PortfolioArgs, config: &RunConfig, format: &OutputFormat) -> Result<()> {
    let api = ApiSettings::from_env();
    let cutoff = date_or_today(args.date.as_deref())?;
    let wanted = LegislatorId::from(args.senator.trim());

    let legislators = fetch_legislators(args.feed_file.as_deref(), &api).await?;
    let legislator = legislators
        .into_iter()
        .find(|l| l.id == wanted)
        .ok_or_else(|| anyhow!("legislator '{}' not found in feed", wanted))?;

    let oracle = price_oracle(config, &api)?;
    let disclosures = normalize(&legislator.name, legislator.disclosures, &oracle).await?;
    let ledger = Ledger::new(&disclosures)?;
    let breakdown = portfolio_breakdown(&ledger, cutoff, &oracle).await;
    let top_positions = top_holdings(&breakdown.positions, &oracle, cutoff, config.top_n).await;

    let mut positions = Vec::new();
    for (ticker, shares) in &breakdown.positions {
        if *shares > 0.0 {
            positions.push(PricedPosition {
                ticker: ticker.clone(),
                shares: *shares,
                price: oracle.price(ticker, cutoff).await,
            });
        }
    }

    let ignored = if args.verbose {
        ignored_records(&disclosures)
    } else {
        Vec::new()
    };

    let report = PortfolioReport {
        id: legislator.id,
        name: legislator.name,
        date: cutoff,
        total_invested: breakdown.total,
        realized_cash: breakdown.cash,
        portfolio_value: breakdown.value,
        estimated_return: PeriodReturn::new(breakdown.value, breakdown.total).value(),
        purchases: breakdown.purchases,
        sales: breakdown.sales,
        positions,
        top_positions,
        unaccounted: breakdown.unaccounted,
        ignored,
    };

    if let OutputFormat::Json = format {
        print_json(&report);
        return Ok(());
    }

    eprintln!(
        "{} ({}) as of {}: invested ${:.2}, cash ${:.2}, value ${:.2}, {} purchases, {} sales",
        report.name,
        report.id,
        report.date,
        report.total_invested,
        report.realized_cash,
        report.portfolio_value,
        report.purchases,
        report.sales
    );
    let priced: Vec<(String, f64, Option<f64>)> = report
        .positions
        .iter()
        .map(|p| (p.ticker.clone(), p.shares, p.price))
        .collect();
    print_rows(build_position_rows(&priced), format)?;

    if !report.unaccounted.is_empty() {
        eprintln!("{} unaccounted sales:", report.unaccounted.len());
        print_rows(build_unaccounted_rows(&report.unaccounted), format)?;
    }
    for record in &report.ignored {
        eprintln!(
            "  {} {} {}: {}",
            record.transaction_date.as_deref().unwrap_or("?"),
            record.kind.as_deref().unwrap_or("?"),
            record.ticker.as_deref().unwrap_or("?"),
            record.ignored
        );
    }
    Ok(())
}
