use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    AppError, CalendarEvent, CalendarWindowParams, CaseFile, CaseListParams,
    CreateCalendarEventRequest, CreateCaseRequest, MessageResponse, ProviderRef,
    UpdateCaseRequest,
};

use crate::error_convert::ValidateRequest;
use crate::provider::ProviderScope;
use crate::rest::parse_uuid;

async fn ensure_case(pool: &Pool<Postgres>, provider: ProviderRef, id: Uuid) -> Result<CaseFile, AppError> {
    crate::repo::cases::find(pool, provider, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {id} not found")))
}

// ---------------------------------------------------------------------------
// POST /api/cases
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateCaseRequest,
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 201, description = "Case opened", body = CaseFile),
        (status = 404, description = "Linked request not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn create_case(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Json(body): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseFile>), AppError> {
    body.validate_request()?;

    if let Some(request_id) = body.request_id {
        crate::repo::requests::find_by_id(&pool, request_id)
            .await?
            .filter(|r| r.is_owned_by_provider(scope.provider_type(), scope.provider_id()))
            .ok_or_else(|| AppError::not_found(format!("Request {request_id} not found")))?;
    }

    let case = crate::repo::cases::create(&pool, scope.0, &body).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

// ---------------------------------------------------------------------------
// GET /api/cases
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/cases",
    params(
        CaseListParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Cases", body = Vec<CaseFile>)),
    tag = "cases"
)]
pub async fn list_cases(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<CaseListParams>,
) -> Result<Json<Vec<CaseFile>>, AppError> {
    let status = params.validated_status()?;
    Ok(Json(crate::repo::cases::list(&pool, scope.0, status).await?))
}

/// Open cases past their SLA deadline.
#[utoipa::path(
    get,
    path = "/api/cases/overdue",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Overdue cases", body = Vec<CaseFile>)),
    tag = "cases"
)]
pub async fn list_overdue_cases(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
) -> Result<Json<Vec<CaseFile>>, AppError> {
    Ok(Json(crate::repo::cases::list_overdue(&pool, scope.0).await?))
}

#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case", body = CaseFile),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn get_case(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Path(id): Path<String>,
) -> Result<Json<CaseFile>, AppError> {
    let id = parse_uuid(&id, "id")?;
    Ok(Json(ensure_case(&pool, scope.0, id).await?))
}

// ---------------------------------------------------------------------------
// PATCH /api/cases/{id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    patch,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    request_body = UpdateCaseRequest,
    responses(
        (status = 200, description = "Case updated", body = CaseFile),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn update_case(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Path(id): Path<String>,
    Json(body): Json<UpdateCaseRequest>,
) -> Result<Json<CaseFile>, AppError> {
    let id = parse_uuid(&id, "id")?;
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::invalid_field("title", "Title cannot be empty"));
    }
    crate::repo::cases::update(&pool, scope.0, id, &body)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Case {id} not found")))
}

#[utoipa::path(
    post,
    path = "/api/cases/{id}/close",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case closed", body = CaseFile),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "cases"
)]
pub async fn close_case(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Path(id): Path<String>,
) -> Result<Json<CaseFile>, AppError> {
    let id = parse_uuid(&id, "id")?;
    crate::repo::cases::close(&pool, scope.0, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Case {id} not found")))
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/calendar/events",
    request_body = CreateCalendarEventRequest,
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 201, description = "Event created", body = CalendarEvent),
        (status = 422, description = "Invalid event", body = AppError)
    ),
    tag = "calendar"
)]
pub async fn create_event(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Json(body): Json<CreateCalendarEventRequest>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    body.check()?;
    if let Some(case_id) = body.case_id {
        ensure_case(&pool, scope.0, case_id).await?;
    }
    let event = crate::repo::cases::create_event(&pool, scope.0, &body).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Events starting in `[from, to)`.
#[utoipa::path(
    get,
    path = "/api/calendar/events",
    params(
        CalendarWindowParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Events", body = Vec<CalendarEvent>)),
    tag = "calendar"
)]
pub async fn list_events(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<CalendarWindowParams>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    if params.to <= params.from {
        return Err(AppError::bad_request("`to` must be after `from`"));
    }
    let events = crate::repo::cases::list_events(&pool, scope.0, params.from, params.to).await?;
    Ok(Json(events))
}

#[utoipa::path(
    delete,
    path = "/api/calendar/events/{id}",
    params(("id" = String, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "calendar"
)]
pub async fn delete_event(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_uuid(&id, "id")?;
    if !crate::repo::cases::delete_event(&pool, scope.0, id).await? {
        return Err(AppError::not_found(format!("Event {id} not found")));
    }
    Ok(Json(MessageResponse::new("Event deleted")))
}
