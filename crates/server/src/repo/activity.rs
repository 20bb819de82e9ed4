use shared_types::{ActivityLog, AppError, NewActivity};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

/// Append an entry. A failed write is logged and swallowed so it never
/// undoes the mutation it describes.
pub async fn record(pool: &Pool<Postgres>, entry: NewActivity) {
    let result = sqlx::query!(
        r#"
        INSERT INTO activity_logs (actor_id, provider_type, provider_id, action, entity_type, entity_id, details)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
        entry.actor_id,
        entry.provider.map(|p| p.provider_type.as_str()),
        entry.provider.map(|p| p.provider_id),
        entry.action,
        entry.entity_type,
        &entry.entity_id,
        &entry.details,
    )
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(
            error = %e,
            action = entry.action,
            entity_type = entry.entity_type,
            entity_id = %entry.entity_id,
            "Failed to write activity log"
        );
    }
}

pub async fn list_for_actor(
    pool: &Pool<Postgres>,
    actor_id: i64,
    page: i64,
    limit: i64,
) -> Result<(Vec<ActivityLog>, i64), AppError> {
    let total = sqlx::query_scalar!(
        r#"SELECT COUNT(*) AS "count!" FROM activity_logs WHERE actor_id = $1"#,
        actor_id,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as!(
        ActivityLog,
        r#"
        SELECT id, actor_id, provider_type, provider_id, action, entity_type, entity_id, details, created_at
        FROM activity_logs
        WHERE actor_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        actor_id,
        limit,
        (page - 1) * limit,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn list_all(
    pool: &Pool<Postgres>,
    entity_type: Option<&str>,
    entity_id: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<ActivityLog>, i64), AppError> {
    let total = sqlx::query_scalar!(
        r#"
        SELECT COUNT(*) AS "count!" FROM activity_logs
        WHERE ($1::text IS NULL OR entity_type = $1) AND ($2::text IS NULL OR entity_id = $2)
        "#,
        entity_type,
        entity_id,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as!(
        ActivityLog,
        r#"
        SELECT id, actor_id, provider_type, provider_id, action, entity_type, entity_id, details, created_at
        FROM activity_logs
        WHERE ($1::text IS NULL OR entity_type = $1) AND ($2::text IS NULL OR entity_id = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
        entity_type,
        entity_id,
        limit,
        (page - 1) * limit,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}
