/// Remove self-created accounts that were never activated.
/// The API already runs this daily at 01:00; this binary is for manual runs.
///
/// Usage: purge-stale-accounts [--days N]
///   --days N  : Age threshold in days (default: STALE_ACCOUNT_DAYS or 3)

use clap::Parser;
use chrono::Utc;

use semear_api::{
    config,
    db::{self, PgStore},
    services::cleanup::CleanupService,
};

#[derive(Parser)]
#[command(name = "purge-stale-accounts", about = "Purge unactivated accounts from the Semear database")]
struct Args {
    /// Accounts created more than this many days ago are removed
    #[arg(long)]
    days: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let days = match args.days {
        Some(days) => days,
        None => std::env::var("STALE_ACCOUNT_DAYS")
            .unwrap_or_else(|_| "3".into())
            .parse()?,
    };

    let database_url = config::required("DATABASE_URL")?;
    let pool = db::create_pool(&database_url, 5).await?;
    let store = PgStore::new(pool);

    tracing::info!("Purging accounts left unactivated for more than {} day(s)...", days);
    let purged = CleanupService::purge_stale_accounts(&store, Utc::now(), days).await?;
    tracing::info!("Purge completed: {} account(s) removed", purged);

    Ok(())
}
