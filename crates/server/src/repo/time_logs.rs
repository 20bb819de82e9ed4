use chrono::NaiveDate;
use shared_types::{AppError, ProviderRef, TimeLog};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn create(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    request_id: Uuid,
    minutes: i32,
    description: &str,
    logged_on: Option<NaiveDate>,
) -> Result<TimeLog, AppError> {
    sqlx::query_as!(
        TimeLog,
        r#"
        INSERT INTO lawyer_time_logs (request_id, provider_type, provider_id, minutes, description, logged_on)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, CURRENT_DATE))
        RETURNING id, request_id, provider_type, provider_id, minutes, description, logged_on, created_at
        "#,
        request_id,
        provider.provider_type.as_str(),
        provider.provider_id,
        minutes,
        description.trim(),
        logged_on,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    request_id: Option<Uuid>,
) -> Result<Vec<TimeLog>, AppError> {
    sqlx::query_as!(
        TimeLog,
        r#"
        SELECT id, request_id, provider_type, provider_id, minutes, description, logged_on, created_at
        FROM lawyer_time_logs
        WHERE provider_type = $1 AND provider_id = $2 AND ($3::uuid IS NULL OR request_id = $3)
        ORDER BY logged_on DESC, created_at DESC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        request_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Minutes logged by the provider, optionally limited to some requests.
pub async fn total_minutes(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    request_ids: Option<&[Uuid]>,
) -> Result<i64, AppError> {
    sqlx::query_scalar!(
        r#"
        SELECT COALESCE(SUM(minutes), 0)::bigint AS "total!"
        FROM lawyer_time_logs
        WHERE provider_type = $1 AND provider_id = $2
          AND ($3::uuid[] IS NULL OR request_id = ANY($3))
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        request_ids,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
