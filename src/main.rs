use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foliosync::config::AppConfig;
use foliosync::db;

mod cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = cli::Cli::parse();
    let config = AppConfig::from_env()?;

    db::init(&config.database_url)?;
    let pool = db::create_pool(&config.database_url)?;
    db::run_migrations(&pool)?;

    match args.command {
        cli::Commands::Update => cli::run_update(&config, pool).await,
        cli::Commands::Import { file, dry_run } => cli::run_import(pool, &file, dry_run),
    }
}
