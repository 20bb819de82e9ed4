use shared_types::{
    AppError, CreateTicketRequest, SupportTicket, TicketReply, TicketStatus,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn create(pool: &Pool<Postgres>, user_id: i64, req: &CreateTicketRequest) -> Result<SupportTicket, AppError> {
    sqlx::query_as!(
        SupportTicket,
        r#"
        INSERT INTO support_tickets (user_id, subject, body, priority)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, subject, body, priority, status, created_at, updated_at
        "#,
        user_id,
        req.subject.trim(),
        req.body.trim(),
        req.priority.as_str(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_for_user(pool: &Pool<Postgres>, user_id: i64) -> Result<Vec<SupportTicket>, AppError> {
    sqlx::query_as!(
        SupportTicket,
        r#"
        SELECT id, user_id, subject, body, priority, status, created_at, updated_at
        FROM support_tickets
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
        user_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Admin queue, optionally filtered by status. Returns `(rows, total)`.
pub async fn list_all(
    pool: &Pool<Postgres>,
    status: Option<TicketStatus>,
    page: i64,
    limit: i64,
) -> Result<(Vec<SupportTicket>, i64), AppError> {
    let status = status.map(|s| s.as_str());
    let total = sqlx::query_scalar!(
        r#"SELECT COUNT(*) AS "count!" FROM support_tickets WHERE ($1::text IS NULL OR status = $1)"#,
        status,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as!(
        SupportTicket,
        r#"
        SELECT id, user_id, subject, body, priority, status, created_at, updated_at
        FROM support_tickets
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY updated_at DESC
        LIMIT $2 OFFSET $3
        "#,
        status,
        limit,
        (page - 1) * limit,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn find(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<SupportTicket>, AppError> {
    sqlx::query_as!(
        SupportTicket,
        r#"
        SELECT id, user_id, subject, body, priority, status, created_at, updated_at
        FROM support_tickets
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn replies(pool: &Pool<Postgres>, ticket_id: Uuid) -> Result<Vec<TicketReply>, AppError> {
    sqlx::query_as!(
        TicketReply,
        r#"
        SELECT id, ticket_id, author_id, is_staff, body, created_at
        FROM support_ticket_replies
        WHERE ticket_id = $1
        ORDER BY created_at ASC
        "#,
        ticket_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Insert a reply and move the ticket to `next` in one transaction.
/// The status update is guarded so a concurrent close wins.
pub async fn reply(
    pool: &Pool<Postgres>,
    ticket_id: Uuid,
    author_id: i64,
    is_staff: bool,
    body: &str,
    next: TicketStatus,
) -> Result<Option<TicketReply>, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let moved = sqlx::query!(
        r#"
        UPDATE support_tickets
        SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status <> 'closed'
        "#,
        ticket_id,
        next.as_str(),
    )
    .execute(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if moved.rows_affected() == 0 {
        tx.rollback().await.map_err(SqlxErrorExt::into_app_error)?;
        return Ok(None);
    }

    let reply = sqlx::query_as!(
        TicketReply,
        r#"
        INSERT INTO support_ticket_replies (ticket_id, author_id, is_staff, body)
        VALUES ($1, $2, $3, $4)
        RETURNING id, ticket_id, author_id, is_staff, body, created_at
        "#,
        ticket_id,
        author_id,
        is_staff,
        body.trim(),
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(Some(reply))
}

pub async fn close(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<SupportTicket>, AppError> {
    sqlx::query_as!(
        SupportTicket,
        r#"
        UPDATE support_tickets
        SET status = 'closed', updated_at = NOW()
        WHERE id = $1
        RETURNING id, user_id, subject, body, priority, status, created_at, updated_at
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

