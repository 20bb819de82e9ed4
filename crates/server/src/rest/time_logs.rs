use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, CreateTimeLogRequest, TimeLog, TimeLogListParams, TimeLogListResponse};

use crate::provider::ProviderScope;

// ---------------------------------------------------------------------------
// POST /api/time-logs
// ---------------------------------------------------------------------------

/// Log minutes worked on one of the provider's requests.
#[utoipa::path(
    post,
    path = "/api/time-logs",
    request_body = CreateTimeLogRequest,
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 201, description = "Time logged", body = TimeLog),
        (status = 404, description = "Request not found for this provider", body = AppError),
        (status = 422, description = "Minutes out of range", body = AppError)
    ),
    tag = "time-logs"
)]
pub async fn create_time_log(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Json(body): Json<CreateTimeLogRequest>,
) -> Result<(StatusCode, Json<TimeLog>), AppError> {
    body.validate_minutes()?;

    crate::repo::requests::find_by_id(&pool, body.request_id)
        .await?
        .filter(|r| r.is_owned_by_provider(scope.provider_type(), scope.provider_id()))
        .ok_or_else(|| AppError::not_found(format!("Request {} not found", body.request_id)))?;

    let entry = crate::repo::time_logs::create(
        &pool,
        scope.0,
        body.request_id,
        body.minutes,
        &body.description,
        body.logged_on,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// ---------------------------------------------------------------------------
// GET /api/time-logs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/time-logs",
    params(
        TimeLogListParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Time entries with total", body = TimeLogListResponse)),
    tag = "time-logs"
)]
pub async fn list_time_logs(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<TimeLogListParams>,
) -> Result<Json<TimeLogListResponse>, AppError> {
    let entries = crate::repo::time_logs::list(&pool, scope.0, params.request_id).await?;
    Ok(Json(TimeLogListResponse::new(entries)))
}
