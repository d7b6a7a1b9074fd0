use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use semear_api::{
    config::Config,
    db::{self, PgStore, Store},
    routes,
    services::{cleanup_scheduler, metrics},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url, 20).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    metrics::start(store.clone());
    cleanup_scheduler::start(store.clone(), config.stale_account_days);

    let app = routes::router(AppState::new(store, config.clone()));

    let addr = format!("{}:{}", config.host, config.port);
    info!("Semear API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
