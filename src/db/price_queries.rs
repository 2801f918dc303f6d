use bigdecimal::BigDecimal;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::market_provider::ExternalPriceBar;

/// Prices land in NUMERIC(12, 4) columns rounded to exactly 4 fractional
/// digits. Going through the formatted string keeps the stored decimal free
/// of binary-float residue (10.1234 stays 10.1234, not 10.1233999...).
fn price_decimal(value: f64) -> Result<BigDecimal, AppError> {
    format!("{value:.4}")
        .parse::<BigDecimal>()
        .map_err(|_| AppError::Validation(format!("non-finite price value: {value}")))
}

// The column is declared non-negative; clamp rather than fail.
fn clamp_volume(volume: i64) -> i64 {
    volume.max(0)
}

/// Upserts all bars for one symbol inside a single transaction, keyed on
/// (symbol, date). Low/high/close/volume are replaced on conflict;
/// created_at keeps the value from the first insert.
pub async fn upsert_bars(
    pool: &PgPool,
    symbol: &str,
    bars: &[ExternalPriceBar],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(|e| {
        error!("Failed to begin transaction for {}: {}", symbol, e);
        AppError::Db(e)
    })?;

    for bar in bars {
        sqlx::query(
            r#"
            INSERT INTO stocks (id, symbol, date, low, high, close, volume)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (symbol, date) DO UPDATE SET
                low = EXCLUDED.low,
                high = EXCLUDED.high,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(symbol)
        .bind(bar.date)
        .bind(price_decimal(bar.low)?)
        .bind(price_decimal(bar.high)?)
        .bind(price_decimal(bar.close)?)
        .bind(clamp_volume(bar.volume))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                "Failed to upsert bar for {} on {}: {}",
                symbol, bar.date, e
            );
            AppError::Db(e)
        })?;
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit bars for {}: {}", symbol, e);
        AppError::Db(e)
    })?;

    Ok(())
}
