mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use congressmoney_lib::RunConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "congressmoney")]
#[command(about = "Estimate legislator portfolio performance from stock disclosures")]
struct Cli {
    /// Output format: table, json, csv, md
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Run configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the aggregate snapshot from the feeds
    Build(commands::build::BuildArgs),
    /// Show one legislator's reconstructed portfolio at a date
    Portfolio(commands::portfolio::PortfolioArgs),
    /// Rank legislators from a persisted snapshot
    Summary(commands::summary::SummaryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("congressmoney=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "md" | "markdown" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let config = RunConfig::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Build(args) => commands::build::run(args, &config).await?,
        Commands::Portfolio(args) => commands::portfolio::run(args, &config, &format).await?,
        Commands::Summary(args) => commands::summary::run(args, &format)?,
    }

    Ok(())
}
