use shared_types::{AppError, UserDevice, UserSettings};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn find(pool: &Pool<Postgres>, user_id: i64) -> Result<Option<UserSettings>, AppError> {
    sqlx::query_as!(
        UserSettings,
        r#"
        SELECT user_id, language, email_notifications, sms_notifications, theme
        FROM user_settings
        WHERE user_id = $1
        "#,
        user_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn upsert(pool: &Pool<Postgres>, s: &UserSettings) -> Result<UserSettings, AppError> {
    sqlx::query_as!(
        UserSettings,
        r#"
        INSERT INTO user_settings (user_id, language, email_notifications, sms_notifications, theme)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET
            language = EXCLUDED.language,
            email_notifications = EXCLUDED.email_notifications,
            sms_notifications = EXCLUDED.sms_notifications,
            theme = EXCLUDED.theme
        RETURNING user_id, language, email_notifications, sms_notifications, theme
        "#,
        s.user_id,
        &s.language,
        s.email_notifications,
        s.sms_notifications,
        &s.theme,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Registering a known token refreshes its platform and `last_seen_at`.
pub async fn upsert_device(
    pool: &Pool<Postgres>,
    user_id: i64,
    device_token: &str,
    platform: &str,
) -> Result<UserDevice, AppError> {
    sqlx::query_as!(
        UserDevice,
        r#"
        INSERT INTO user_devices (user_id, device_token, platform)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, device_token) DO UPDATE SET
            platform = EXCLUDED.platform,
            last_seen_at = NOW()
        RETURNING id, user_id, device_token, platform, last_seen_at, created_at
        "#,
        user_id,
        device_token,
        platform,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_devices(pool: &Pool<Postgres>, user_id: i64) -> Result<Vec<UserDevice>, AppError> {
    sqlx::query_as!(
        UserDevice,
        r#"
        SELECT id, user_id, device_token, platform, last_seen_at, created_at
        FROM user_devices
        WHERE user_id = $1
        ORDER BY last_seen_at DESC
        "#,
        user_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn delete_device(pool: &Pool<Postgres>, user_id: i64, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query!(
        "DELETE FROM user_devices WHERE id = $1 AND user_id = $2",
        id,
        user_id,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}
