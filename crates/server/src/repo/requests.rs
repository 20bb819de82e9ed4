use chrono::{DateTime, Utc};
use shared_types::{AppError, ProviderRef, RequestPriority, RequestStatus, ServiceRequest};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Fields for a new request, already checked against the provider's pricing.
pub struct NewServiceRequest<'a> {
    pub subscriber_id: i64,
    pub service_id: Uuid,
    pub provider: ProviderRef,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: RequestPriority,
    pub quoted_price: Option<f64>,
    pub commission_rate: i32,
    pub sla_deadline: DateTime<Utc>,
}

pub async fn create(pool: &Pool<Postgres>, new: NewServiceRequest<'_>) -> Result<ServiceRequest, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        INSERT INTO service_requests (
            subscriber_id, service_id, provider_type, provider_id, title, description,
            priority, quoted_price, commission_rate, sla_deadline
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        "#,
        new.subscriber_id,
        new.service_id,
        new.provider.provider_type.as_str(),
        new.provider.provider_id,
        new.title.trim(),
        new.description,
        new.priority.as_str(),
        new.quoted_price,
        new.commission_rate,
        new.sla_deadline,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        SELECT id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        FROM service_requests
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_for_subscriber(
    pool: &Pool<Postgres>,
    subscriber_id: i64,
    status: Option<RequestStatus>,
) -> Result<Vec<ServiceRequest>, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        SELECT id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        FROM service_requests
        WHERE subscriber_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
        subscriber_id,
        status.map(|s| s.as_str()),
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_for_provider(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    status: Option<RequestStatus>,
) -> Result<Vec<ServiceRequest>, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        SELECT id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        FROM service_requests
        WHERE provider_type = $1 AND provider_id = $2 AND ($3::text IS NULL OR status = $3)
        ORDER BY created_at DESC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        status.map(|s| s.as_str()),
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Open requests whose SLA deadline has passed, most overdue first.
pub async fn list_overdue(pool: &Pool<Postgres>, provider: ProviderRef) -> Result<Vec<ServiceRequest>, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        SELECT id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        FROM service_requests
        WHERE provider_type = $1 AND provider_id = $2
          AND status IN ('pending', 'accepted', 'in_progress')
          AND sla_deadline < NOW()
        ORDER BY sla_deadline ASC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Compare-and-set on status. `None` means the row moved on since it was read.
pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    from: RequestStatus,
    to: RequestStatus,
) -> Result<Option<ServiceRequest>, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        UPDATE service_requests
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        "#,
        id,
        from.as_str(),
        to.as_str(),
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Requests for a provider inside an optional `[from, to)` window on `created_at`.
pub async fn list_in_window(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<ServiceRequest>, AppError> {
    sqlx::query_as!(
        ServiceRequest,
        r#"
        SELECT id, subscriber_id, service_id, provider_type, provider_id, title, description,
            status, priority, quoted_price, commission_rate, sla_deadline, created_at, updated_at
        FROM service_requests
        WHERE provider_type = $1 AND provider_id = $2
          AND ($3::timestamptz IS NULL OR created_at >= $3)
          AND ($4::timestamptz IS NULL OR created_at < $4)
        ORDER BY created_at ASC
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

/// `(quoted_price, commission_rate)` of every priced, completed request.
pub async fn completed_earnings<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    provider: ProviderRef,
) -> Result<Vec<(f64, i32)>, AppError> {
    let rows = sqlx::query!(
        r#"
        SELECT quoted_price AS "quoted_price!", commission_rate
        FROM service_requests
        WHERE provider_type = $1 AND provider_id = $2
          AND status = 'completed' AND quoted_price IS NOT NULL
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_all(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows.into_iter().map(|r| (r.quoted_price, r.commission_rate)).collect())
}
