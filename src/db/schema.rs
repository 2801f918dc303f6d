use sqlx::PgPool;
use tracing::info;

/// Idempotent schema setup, run once per invocation before any write.
/// Everything is "if not exists" so a partially provisioned database is fine;
/// the whole batch commits as one transaction.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    // uuid_generate_v4() backs both tables' id defaults
    sqlx::query(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS company_overviews (
            id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
            symbol VARCHAR(20) NOT NULL UNIQUE,
            asset_type VARCHAR(50) NOT NULL DEFAULT 'N/A',
            name VARCHAR(255) NOT NULL DEFAULT 'N/A',
            description TEXT NOT NULL DEFAULT 'N/A',
            exchange VARCHAR(50) NOT NULL DEFAULT 'N/A',
            sector VARCHAR(100) NOT NULL DEFAULT 'N/A',
            industry VARCHAR(100) NOT NULL DEFAULT 'N/A',
            market_capitalization VARCHAR(50) NOT NULL DEFAULT 'N/A',
            updated_at TIMESTAMPTZ DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stocks (
            id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
            symbol VARCHAR(20) NOT NULL,
            date DATE NOT NULL,
            low NUMERIC(12, 4) NOT NULL,
            high NUMERIC(12, 4) NOT NULL,
            close NUMERIC(12, 4) NOT NULL,
            volume BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ DEFAULT NOW(),
            UNIQUE(symbol, date)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Pre-volume deployments get the column added in place
    sqlx::query("ALTER TABLE stocks ADD COLUMN IF NOT EXISTS volume BIGINT NOT NULL DEFAULT 0")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Tables ready");
    Ok(())
}
