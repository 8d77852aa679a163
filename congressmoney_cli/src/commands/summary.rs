//! The `summary` subcommand: ranks legislators from a persisted snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use congressmoney_lib::read_snapshot;
use congressmoney_lib::snapshot::DEFAULT_SNAPSHOT_FILE;

use crate::output::{build_summary_rows, format_return, format_value, print_rows, OutputFormat};

#[derive(Args)]
pub struct SummaryArgs {
    /// Snapshot written by `build`
    #[arg(long, default_value = DEFAULT_SNAPSHOT_FILE)]
    pub snapshot: PathBuf,

    /// Show only the top N legislators
    #[arg(long)]
    pub top: Option<usize>,

    /// Include inactive and excluded legislators
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: &SummaryArgs, format: &OutputFormat) -> Result<()> {
    let snapshot = read_snapshot(&args.snapshot)
        .with_context(|| format!("reading snapshot {}", args.snapshot.display()))?;

    let mut rows = build_summary_rows(&snapshot, args.all);
    if let Some(top) = args.top {
        rows.truncate(top);
    }

    let daily = &snapshot.daily_summary;
    let index_latest = daily.index_returns.values().next_back().copied().unwrap_or(1.0);
    eprintln!(
        "{} legislators in cohort, {} to {}: mean return {}, combined value {}, {} vs {}",
        daily.senator_count,
        snapshot.start_date,
        snapshot.end_date,
        format_return(daily.estimated_return),
        format_value(daily.portfolio_value),
        daily.index_ticker,
        format_return(index_latest)
    );

    print_rows(rows, format)
}
