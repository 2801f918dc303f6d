pub mod overview_queries;
pub mod price_queries;
pub mod schema;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::external::market_provider::{ExternalOverview, ExternalPriceBar};

/// Write side of the seeder. The orchestrator only sees this trait so tests
/// can swap in an in-memory store.
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Insert-or-update one overview row keyed on symbol. Replaces every
    /// descriptive field and refreshes the row's updated_at.
    async fn upsert_overview(&self, overview: &ExternalOverview) -> Result<(), AppError>;

    /// Insert-or-update all bars for one symbol, keyed on (symbol, date),
    /// inside a single transaction. Leaves created_at untouched on update.
    async fn upsert_price_bars(
        &self,
        symbol: &str,
        bars: &[ExternalPriceBar],
    ) -> Result<(), AppError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeedStore for PgStore {
    async fn upsert_overview(&self, overview: &ExternalOverview) -> Result<(), AppError> {
        overview_queries::upsert(&self.pool, overview).await?;
        Ok(())
    }

    async fn upsert_price_bars(
        &self,
        symbol: &str,
        bars: &[ExternalPriceBar],
    ) -> Result<(), AppError> {
        price_queries::upsert_bars(&self.pool, symbol, bars).await
    }
}
