use chrono::{DateTime, Utc};
use shared_types::{
    AppError, CalendarEvent, CaseFile, CreateCalendarEventRequest, CreateCaseRequest, ProviderRef,
    UpdateCaseRequest,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn create(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    req: &CreateCaseRequest,
) -> Result<CaseFile, AppError> {
    sqlx::query_as!(
        CaseFile,
        r#"
        INSERT INTO case_management (provider_type, provider_id, request_id, title, client_name, sla_deadline, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, provider_type, provider_id, request_id, title, client_name,
            status, sla_deadline, notes, created_at, updated_at
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        req.request_id,
        req.title.trim(),
        req.client_name.trim(),
        req.sla_deadline,
        req.notes.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    status: Option<&str>,
) -> Result<Vec<CaseFile>, AppError> {
    sqlx::query_as!(
        CaseFile,
        r#"
        SELECT id, provider_type, provider_id, request_id, title, client_name,
            status, sla_deadline, notes, created_at, updated_at
        FROM case_management
        WHERE provider_type = $1 AND provider_id = $2 AND ($3::text IS NULL OR status = $3)
        ORDER BY created_at DESC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        status,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_overdue(pool: &Pool<Postgres>, provider: ProviderRef) -> Result<Vec<CaseFile>, AppError> {
    sqlx::query_as!(
        CaseFile,
        r#"
        SELECT id, provider_type, provider_id, request_id, title, client_name,
            status, sla_deadline, notes, created_at, updated_at
        FROM case_management
        WHERE provider_type = $1 AND provider_id = $2
          AND status = 'open' AND sla_deadline < NOW()
        ORDER BY sla_deadline ASC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find(pool: &Pool<Postgres>, provider: ProviderRef, id: Uuid) -> Result<Option<CaseFile>, AppError> {
    sqlx::query_as!(
        CaseFile,
        r#"
        SELECT id, provider_type, provider_id, request_id, title, client_name,
            status, sla_deadline, notes, created_at, updated_at
        FROM case_management
        WHERE id = $1 AND provider_type = $2 AND provider_id = $3
        "#,
        id,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Partial update; absent fields keep their value.
pub async fn update(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    id: Uuid,
    req: &UpdateCaseRequest,
) -> Result<Option<CaseFile>, AppError> {
    sqlx::query_as!(
        CaseFile,
        r#"
        UPDATE case_management SET
            title = COALESCE($4, title),
            client_name = COALESCE($5, client_name),
            sla_deadline = COALESCE($6, sla_deadline),
            notes = COALESCE($7, notes),
            updated_at = NOW()
        WHERE id = $1 AND provider_type = $2 AND provider_id = $3
        RETURNING id, provider_type, provider_id, request_id, title, client_name,
            status, sla_deadline, notes, created_at, updated_at
        "#,
        id,
        provider.provider_type.as_str(),
        provider.provider_id,
        req.title.as_deref().map(str::trim),
        req.client_name.as_deref().map(str::trim),
        req.sla_deadline,
        req.notes.as_deref(),
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn close(pool: &Pool<Postgres>, provider: ProviderRef, id: Uuid) -> Result<Option<CaseFile>, AppError> {
    sqlx::query_as!(
        CaseFile,
        r#"
        UPDATE case_management SET status = 'closed', updated_at = NOW()
        WHERE id = $1 AND provider_type = $2 AND provider_id = $3
        RETURNING id, provider_type, provider_id, request_id, title, client_name,
            status, sla_deadline, notes, created_at, updated_at
        "#,
        id,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

pub async fn create_event(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    req: &CreateCalendarEventRequest,
) -> Result<CalendarEvent, AppError> {
    sqlx::query_as!(
        CalendarEvent,
        r#"
        INSERT INTO calendar_events (provider_type, provider_id, case_id, title, starts_at, ends_at, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, provider_type, provider_id, case_id, title, starts_at, ends_at, location, created_at
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        req.case_id,
        req.title.trim(),
        req.starts_at,
        req.ends_at,
        req.location.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Events starting inside `[from, to)`.
pub async fn list_events(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>, AppError> {
    sqlx::query_as!(
        CalendarEvent,
        r#"
        SELECT id, provider_type, provider_id, case_id, title, starts_at, ends_at, location, created_at
        FROM calendar_events
        WHERE provider_type = $1 AND provider_id = $2 AND starts_at >= $3 AND starts_at < $4
        ORDER BY starts_at ASC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        from,
        to,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn delete_event(pool: &Pool<Postgres>, provider: ProviderRef, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query!(
        "DELETE FROM calendar_events WHERE id = $1 AND provider_type = $2 AND provider_id = $3",
        id,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}
