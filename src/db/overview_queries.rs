use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::external::market_provider::ExternalOverview;

/// Single-row upsert keyed on symbol. Every descriptive field is replaced and
/// updated_at is refreshed, so the row is always a point-in-time snapshot.
pub async fn upsert(pool: &PgPool, overview: &ExternalOverview) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO company_overviews
            (id, symbol, asset_type, name, description, exchange, sector, industry, market_capitalization, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        ON CONFLICT (symbol) DO UPDATE SET
            asset_type = EXCLUDED.asset_type,
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            exchange = EXCLUDED.exchange,
            sector = EXCLUDED.sector,
            industry = EXCLUDED.industry,
            market_capitalization = EXCLUDED.market_capitalization,
            updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&overview.symbol)
    .bind(&overview.asset_type)
    .bind(&overview.name)
    .bind(&overview.description)
    .bind(&overview.exchange)
    .bind(&overview.sector)
    .bind(&overview.industry)
    .bind(&overview.market_cap)
    .execute(pool)
    .await
    .map_err(|e| {
        error!("Failed to upsert overview for {}: {}", overview.symbol, e);
        e
    })?;

    Ok(())
}
