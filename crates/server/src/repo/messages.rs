use chrono::{DateTime, Utc};
use shared_types::{AppError, Message, RequestAttachment};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn create(
    pool: &Pool<Postgres>,
    request_id: Uuid,
    sender_id: i64,
    sender_role: &str,
    body: &str,
) -> Result<Message, AppError> {
    sqlx::query_as!(
        Message,
        r#"
        INSERT INTO messages (request_id, sender_id, sender_role, body)
        VALUES ($1, $2, $3, $4)
        RETURNING id, request_id, sender_id, sender_role, body, created_at
        "#,
        request_id,
        sender_id,
        sender_role,
        body.trim(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Messages on a request, oldest first, past the `(created_at, id)` cursor.
pub async fn list(
    pool: &Pool<Postgres>,
    request_id: Uuid,
    after: Option<DateTime<Utc>>,
    after_id: Option<Uuid>,
) -> Result<Vec<Message>, AppError> {
    sqlx::query_as!(
        Message,
        r#"
        SELECT id, request_id, sender_id, sender_role, body, created_at
        FROM messages
        WHERE request_id = $1
          AND (
            $2::timestamptz IS NULL
            OR created_at > $2
            OR ($3::uuid IS NOT NULL AND created_at = $2 AND id > $3)
          )
        ORDER BY created_at ASC, id ASC
        "#,
        request_id,
        after,
        after_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

pub async fn create_attachment(
    pool: &Pool<Postgres>,
    attachment: &RequestAttachment,
) -> Result<RequestAttachment, AppError> {
    sqlx::query_as!(
        RequestAttachment,
        r#"
        INSERT INTO request_attachments (id, request_id, uploaded_by, file_name, content_type, object_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, request_id, uploaded_by, file_name, content_type, object_key, created_at
        "#,
        attachment.id,
        attachment.request_id,
        attachment.uploaded_by,
        &attachment.file_name,
        &attachment.content_type,
        &attachment.object_key,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_attachments(
    pool: &Pool<Postgres>,
    request_id: Uuid,
) -> Result<Vec<RequestAttachment>, AppError> {
    sqlx::query_as!(
        RequestAttachment,
        r#"
        SELECT id, request_id, uploaded_by, file_name, content_type, object_key, created_at
        FROM request_attachments
        WHERE request_id = $1
        ORDER BY created_at ASC
        "#,
        request_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
