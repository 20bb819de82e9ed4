use chrono::{DateTime, Utc};
use shared_types::AppError;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// The newest unconsumed, unexpired code for a destination.
#[derive(Debug)]
pub struct PendingOtp {
    pub id: Uuid,
    pub channel: String,
    pub code_hash: String,
}

/// Store a new code unless `destination` already had `max_per_hour` codes in
/// the last hour.
///
/// A transaction-scoped advisory lock on the destination serialises
/// concurrent sends so the count and the insert see the same state.
pub async fn issue(
    pool: &Pool<Postgres>,
    destination: &str,
    channel: &str,
    purpose: &str,
    code_hash: &str,
    expires_at: DateTime<Utc>,
    max_per_hour: i64,
) -> Result<Uuid, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("otp:{destination}"))
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let recent = sqlx::query_scalar!(
        r#"
        SELECT COUNT(*) AS "count!"
        FROM otp_codes
        WHERE destination = $1 AND created_at > NOW() - INTERVAL '1 hour'
        "#,
        destination,
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if recent >= max_per_hour {
        return Err(AppError::rate_limited(
            "Too many verification codes sent. Please try again later.",
        ));
    }

    let id = sqlx::query_scalar!(
        r#"
        INSERT INTO otp_codes (destination, channel, purpose, code_hash, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
        destination,
        channel,
        purpose,
        code_hash,
        expires_at,
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(id)
}

pub async fn latest_pending(
    pool: &Pool<Postgres>,
    destination: &str,
) -> Result<Option<PendingOtp>, AppError> {
    sqlx::query_as!(
        PendingOtp,
        r#"
        SELECT id, channel, code_hash
        FROM otp_codes
        WHERE destination = $1 AND consumed_at IS NULL AND expires_at > NOW()
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        destination,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Spend one attempt on a code. Returns false once `max_attempts` are used up.
pub async fn record_attempt(pool: &Pool<Postgres>, id: Uuid, max_attempts: i32) -> Result<bool, AppError> {
    let spent = sqlx::query_scalar!(
        r#"
        UPDATE otp_codes SET attempts = attempts + 1
        WHERE id = $1 AND attempts < $2
        RETURNING attempts
        "#,
        id,
        max_attempts,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(spent.is_some())
}

/// Mark a code consumed. Returns false if it was consumed concurrently.
pub async fn consume(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query!(
        "UPDATE otp_codes SET consumed_at = NOW() WHERE id = $1 AND consumed_at IS NULL",
        id,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}
