//! The `build` subcommand: evaluates every legislator and writes the snapshot.
//!
//! Legislators are evaluated concurrently with the Semaphore + JoinSet + mpsc
//! pattern over one shared price oracle, so each ticker's history is fetched
//! once for the whole run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use congressmoney_lib::snapshot::DEFAULT_SNAPSHOT_FILE;
use congressmoney_lib::{
    build_snapshot, evaluate_legislator, index_series, write_snapshot, AggregateSettings,
    ApiSettings, Benchmark, Evaluation, LedgerError, LegislatorId, RunConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::{date_or_today, fetch_legislators, price_oracle};

#[derive(Args)]
pub struct BuildArgs {
    /// Snapshot output path
    #[arg(long, default_value = DEFAULT_SNAPSHOT_FILE)]
    pub out: PathBuf,

    /// Read the transaction feed from a local JSON file instead of downloading it
    #[arg(long)]
    pub feed_file: Option<PathBuf>,

    /// Last day of the return series, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub end: Option<String>,

    /// Only evaluate these legislator ids, e.g. smith-jane (repeatable)
    #[arg(long = "senator")]
    pub senators: Vec<String>,
}

/// Message sent from evaluation tasks to the collector.
struct EvaluationResult {
    id: LegislatorId,
    name: String,
    result: Result<Evaluation, LedgerError>,
}

pub async fn run(args: &BuildArgs, config: &RunConfig) -> Result<()> {
    let api = ApiSettings::from_env();
    let end = date_or_today(args.end.as_deref())?;
    let settings = AggregateSettings::from_config(config, end)?;
    if settings.end < settings.start {
        bail!(
            "end date {} is before the start of the tracked year ({})",
            settings.end,
            settings.start
        );
    }
    let exclusions = config.exclusions()?;
    let oracle = Arc::new(price_oracle(config, &api)?);

    let mut legislators = fetch_legislators(args.feed_file.as_deref(), &api).await?;
    if !args.senators.is_empty() {
        let wanted: HashSet<&str> = args.senators.iter().map(String::as_str).collect();
        legislators.retain(|l| wanted.contains(l.id.as_str()));
        if legislators.is_empty() {
            bail!("none of the requested legislators are in the feed");
        }
    }

    let total = legislators.len();
    eprintln!(
        "Calculating returns for {} legislators from {} to {}",
        total, settings.start, settings.end
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} ({eta}) {msg}",
    )?);
    pb.set_message("calculating returns...");

    let concurrency = config.concurrency;
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel::<EvaluationResult>(concurrency * 2);
    let mut join_set = JoinSet::new();

    for legislator in legislators {
        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let oracle = Arc::clone(&oracle);
        let settings = settings.clone();
        join_set.spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let id = legislator.id.clone();
            let name = legislator.name.clone();
            let result = evaluate_legislator(legislator, &oracle, &settings).await;
            let _ = sender.send(EvaluationResult { id, name, result }).await;
        });
    }
    drop(tx);

    let mut evaluations = Vec::with_capacity(total);
    while let Some(evaluation) = rx.recv().await {
        match evaluation.result {
            Ok(done) => {
                pb.set_message(format!("processed {}", evaluation.name));
                evaluations.push(done);
            }
            Err(err) => {
                pb.abandon_with_message(format!("failed on {}", evaluation.id));
                join_set.abort_all();
                bail!(
                    "disclosures for {} ({}) violate the expected schema: {}",
                    evaluation.name,
                    evaluation.id,
                    err
                );
            }
        }
        pb.inc(1);
    }
    while let Some(joined) = join_set.join_next().await {
        joined?;
    }
    pb.finish_with_message("done");

    let benchmark = Benchmark {
        ticker: config.benchmark_ticker.clone(),
        returns: index_series(&oracle, &config.benchmark_ticker, settings.start, settings.end)
            .await,
    };

    let snapshot = build_snapshot(evaluations, &exclusions, benchmark, &settings, Utc::now());
    write_snapshot(&args.out, &snapshot)?;

    let requests = oracle.source().limiter().stats().counts();
    eprintln!(
        "Wrote {} ({} legislators, {} in cohort, {} tickers priced; {})",
        args.out.display(),
        snapshot.senators.len(),
        snapshot.daily_summary.senator_count,
        oracle.cached_tickers(),
        requests
    );
    Ok(())
}
