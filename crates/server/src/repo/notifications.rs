use shared_types::{AppError, NewNotification, Notification, ProviderRef};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn insert<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    n: &NewNotification,
) -> Result<(), AppError> {
    sqlx::query!(
        r#"
        INSERT INTO notifications (user_id, title, body, kind, link) VALUES ($1, $2, $3, $4, $5)
        "#,
        n.user_id,
        &n.title,
        &n.body,
        n.kind,
        n.link.as_deref(),
    )
    .execute(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// One row per user acting for the provider. Returns how many were queued.
pub async fn notify_provider(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    title: &str,
    body: &str,
    kind: &str,
    link: Option<&str>,
) -> Result<u64, AppError> {
    let result = sqlx::query!(
        r#"
        INSERT INTO notifications (user_id, title, body, kind, link)
        SELECT id, $3, $4, $5, $6
        FROM users
        WHERE provider_type = $1 AND provider_id = $2
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        title,
        body,
        kind,
        link,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}

pub async fn list(pool: &Pool<Postgres>, user_id: i64, unread_only: bool) -> Result<Vec<Notification>, AppError> {
    sqlx::query_as!(
        Notification,
        r#"
        SELECT id, user_id, title, body, kind, link, read_at, created_at
        FROM notifications
        WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL)
        ORDER BY created_at DESC
        LIMIT 200
        "#,
        user_id,
        unread_only,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn unread_count(pool: &Pool<Postgres>, user_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar!(
        r#"SELECT COUNT(*) AS "count!" FROM notifications WHERE user_id = $1 AND read_at IS NULL"#,
        user_id,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Marking an already-read notification keeps its first `read_at`.
pub async fn mark_read(pool: &Pool<Postgres>, user_id: i64, id: Uuid) -> Result<Option<Notification>, AppError> {
    sqlx::query_as!(
        Notification,
        r#"
        UPDATE notifications SET read_at = COALESCE(read_at, NOW())
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, title, body, kind, link, read_at, created_at
        "#,
        id,
        user_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn mark_all_read(pool: &Pool<Postgres>, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query!(
        "UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
        user_id,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}
