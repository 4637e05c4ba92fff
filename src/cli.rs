use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use foliosync::config::AppConfig;
use foliosync::db::DbPool;
use foliosync::import::{parse_delta_file, ImportService, ImportSummary};
use foliosync::market_data::{MarketDataRepository, MarketDataService, YahooProvider};
use foliosync::portfolio::{PortfolioService, SnapshotRepository};
use foliosync::transactions::{TransactionRepository, TransactionRepositoryTrait};

#[derive(Parser)]
#[command(name = "foliosync")]
#[command(version)]
#[command(about = "Portfolio reconciliation and valuation engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh prices, FX rates and dividends, then write today's snapshot
    Update,

    /// Parse a Delta CSV export and commit it to the ledger
    Import {
        /// Path to the exported CSV file
        file: PathBuf,

        /// Parse and summarize without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

/// Full reconciliation batch: prices for every ledger ticker, the
/// configured FX pairs, dividend income, and the daily snapshot. Only a
/// structural failure (datastore unreachable) aborts; per-ticker
/// problems are reported and skipped.
pub async fn run_update(config: &AppConfig, pool: Arc<DbPool>) -> Result<()> {
    let transactions = Arc::new(TransactionRepository::new(pool.clone()));
    let market_data_repository = Arc::new(MarketDataRepository::new(pool.clone()));
    let snapshots = Arc::new(SnapshotRepository::new(pool));

    let provider = Arc::new(YahooProvider::new()?);
    let market_data = MarketDataService::new(
        provider,
        market_data_repository.clone(),
        config.market_data.clone(),
    );
    let portfolio = PortfolioService::new(
        transactions.clone(),
        market_data_repository,
        snapshots,
    );

    info!("Starting portfolio update");

    let tickers = transactions.distinct_tickers()?;
    info!("Found {} unique tickers", tickers.len());
    let price_report = market_data.update_prices(&tickers).await;

    let fx_report = market_data.update_fx_rates().await;

    let ledger = transactions.list()?;
    let dividend_report = market_data.update_dividends(&ledger).await;

    let snapshot = portfolio.create_snapshot()?;

    info!("Update complete");
    info!(
        "Prices: {} updated, {} failed",
        price_report.updated,
        price_report.failed_tickers.len()
    );
    info!(
        "FX rates: {} updated, {} failed",
        fx_report.updated,
        fx_report.failed_pairs.len()
    );
    info!("Dividends: {} records", dividend_report.records_written);
    info!("Portfolio value: {}", snapshot.total_value);

    Ok(())
}

/// Parses an export file, logs its summary, and commits it unless this
/// is a dry run. Exits non-zero when any row failed to insert, so a
/// scheduled import surfaces partial failures.
pub fn run_import(pool: Arc<DbPool>, file: &Path, dry_run: bool) -> Result<()> {
    let parsed = parse_delta_file(file)?;
    let summary = ImportSummary::from_rows(&parsed.rows);

    info!(
        "Parsed {} transactions across {} tickers ({} row error(s))",
        summary.total_transactions,
        summary.unique_tickers.len(),
        parsed.errors.len()
    );

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let repository = Arc::new(TransactionRepository::new(pool));
    let outcome = ImportService::new(repository).import_transactions(parsed.rows);

    if !outcome.errors.is_empty() {
        warn!("Insert errors: {:?}", outcome.errors);
        anyhow::bail!(
            "{} row(s) failed to insert ({} inserted, {} skipped)",
            outcome.errors.len(),
            outcome.inserted,
            outcome.skipped
        );
    }

    info!(
        "Import committed: {} inserted, {} duplicates skipped",
        outcome.inserted, outcome.skipped
    );
    Ok(())
}
