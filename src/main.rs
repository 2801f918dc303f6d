mod config;
mod db;
mod errors;
mod external;
mod services;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::PgStore;
use crate::external::yahoo::YahooProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Schema failures are fatal: nothing below can write without the tables.
    db::schema::ensure_tables(&pool).await?;

    let provider = YahooProvider::new();
    let store = PgStore::new(pool.clone());

    let report = services::seed_service::run(&provider, &store, &config.symbols).await;
    println!("{}", report.summary_line());

    pool.close().await;
    Ok(())
}
