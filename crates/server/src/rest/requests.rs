use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, CreateServiceRequestRequest, NewActivity, NewNotification, PricingType, ProviderRef,
    RequestListParams, RequestStatus, ServiceRequest, ServiceRequestResponse,
    UpdateRequestStatusRequest,
};

use crate::auth::extractors::AuthRequired;
use crate::auth::jwt::Claims;
use crate::config::sla_policy;
use crate::error_convert::ValidateRequest;
use crate::provider::{MaybeProvider, ProviderScope};
use crate::rest::parse_uuid;

/// Which side of a request the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Party {
    Subscriber(i64),
    Provider(ProviderRef),
}

impl Party {
    pub(crate) fn role(&self) -> &'static str {
        match self {
            Party::Subscriber(_) => "subscriber",
            Party::Provider(_) => "provider",
        }
    }
}

/// Load a request the caller may see: its subscriber or its provider.
/// Anyone else gets 404 so request ids do not leak.
pub(crate) async fn load_for_party(
    pool: &Pool<Postgres>,
    raw_id: &str,
    claims: Option<&Claims>,
    provider: Option<ProviderRef>,
) -> Result<(ServiceRequest, Party), AppError> {
    if claims.is_none() && provider.is_none() {
        return Err(AppError::unauthorized("Authentication required"));
    }
    let id = parse_uuid(raw_id, "id")?;
    let not_found = || AppError::not_found(format!("Request {id} not found"));

    let request = crate::repo::requests::find_by_id(pool, id)
        .await?
        .ok_or_else(not_found)?;

    if let Some(p) = provider {
        if request.is_owned_by_provider(p.provider_type, p.provider_id) {
            return Ok((request, Party::Provider(p)));
        }
    }
    if let Some(c) = claims {
        if request.subscriber_id == c.sub {
            return Ok((request, Party::Subscriber(c.sub)));
        }
    }
    Err(not_found())
}

fn parse_status_filter(params: &RequestListParams) -> Result<Option<RequestStatus>, AppError> {
    params
        .status
        .as_deref()
        .map(|s| {
            RequestStatus::from_str_opt(s)
                .ok_or_else(|| AppError::bad_request(format!("Unknown request status: {s}")))
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// POST /api/requests
// ---------------------------------------------------------------------------

/// Place a request with a provider for one of its enabled services.
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateServiceRequestRequest,
    responses(
        (status = 201, description = "Request created", body = ServiceRequestResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Provider does not offer this service", body = AppError)
    ),
    tag = "requests"
)]
#[tracing::instrument(skip(pool, claims, body), fields(user_id = claims.sub))]
pub async fn create_request(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<CreateServiceRequestRequest>,
) -> Result<(StatusCode, Json<ServiceRequestResponse>), AppError> {
    body.validate_request()?;
    let provider = ProviderRef {
        provider_type: body.provider_type,
        provider_id: body.provider_id,
    };

    crate::repo::catalog::find_service(&pool, body.service_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::not_found(format!("Service {} not found", body.service_id)))?;

    let offer = crate::repo::provider_services::find_active(&pool, provider, body.service_id)
        .await?
        .ok_or_else(|| AppError::not_found("This provider does not offer the selected service"))?;

    let quoted_price = match offer.pricing() {
        PricingType::Fixed => offer.price,
        PricingType::Range | PricingType::Quote => None,
    };

    let request = crate::repo::requests::create(
        &pool,
        crate::repo::requests::NewServiceRequest {
            subscriber_id: claims.sub,
            service_id: body.service_id,
            provider,
            title: &body.title,
            description: body.description.as_deref(),
            priority: body.priority,
            quoted_price,
            commission_rate: offer.commission_rate,
            sla_deadline: sla_policy().deadline_from(Utc::now(), body.priority),
        },
    )
    .await?;

    let link = format!("/requests/{}", request.id);
    if let Err(e) = crate::repo::notifications::notify_provider(
        &pool,
        provider,
        "New service request",
        &request.title,
        "request.created",
        Some(&link),
    )
    .await
    {
        tracing::warn!(request_id = %request.id, error = %e.message, "New request notification failed");
    }

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: Some(provider),
            action: "request.create",
            entity_type: "service_request",
            entity_id: request.id.to_string(),
            details: serde_json::json!({ "priority": request.priority }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(ServiceRequestResponse::from(request))))
}

// ---------------------------------------------------------------------------
// GET /api/requests/mine
// ---------------------------------------------------------------------------

/// Requests the caller placed as a subscriber.
#[utoipa::path(
    get,
    path = "/api/requests/mine",
    params(RequestListParams),
    responses((status = 200, description = "Subscriber requests", body = Vec<ServiceRequestResponse>)),
    tag = "requests"
)]
pub async fn list_mine(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Query(params): Query<RequestListParams>,
) -> Result<Json<Vec<ServiceRequestResponse>>, AppError> {
    let status = parse_status_filter(&params)?;
    let rows = crate::repo::requests::list_for_subscriber(&pool, claims.sub, status).await?;
    Ok(Json(rows.into_iter().map(ServiceRequestResponse::from).collect()))
}

// ---------------------------------------------------------------------------
// GET /api/provider/requests
// ---------------------------------------------------------------------------

/// Requests addressed to the provider.
#[utoipa::path(
    get,
    path = "/api/provider/requests",
    params(
        RequestListParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Provider requests", body = Vec<ServiceRequestResponse>)),
    tag = "requests"
)]
pub async fn list_for_provider(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<RequestListParams>,
) -> Result<Json<Vec<ServiceRequestResponse>>, AppError> {
    let status = parse_status_filter(&params)?;
    let rows = crate::repo::requests::list_for_provider(&pool, scope.0, status).await?;
    Ok(Json(rows.into_iter().map(ServiceRequestResponse::from).collect()))
}

// ---------------------------------------------------------------------------
// GET /api/provider/requests/overdue
// ---------------------------------------------------------------------------

/// Open requests past their SLA deadline.
#[utoipa::path(
    get,
    path = "/api/provider/requests/overdue",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Overdue requests", body = Vec<ServiceRequestResponse>)),
    tag = "requests"
)]
pub async fn list_overdue(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
) -> Result<Json<Vec<ServiceRequestResponse>>, AppError> {
    let rows = crate::repo::requests::list_overdue(&pool, scope.0).await?;
    Ok(Json(rows.into_iter().map(ServiceRequestResponse::from).collect()))
}

// ---------------------------------------------------------------------------
// GET /api/requests/{id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(("id" = String, Path, description = "Request UUID")),
    responses(
        (status = 200, description = "Request", body = ServiceRequestResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path(id): Path<String>,
) -> Result<Json<ServiceRequestResponse>, AppError> {
    let (request, _) = load_for_party(&pool, &id, Some(&claims), provider).await?;
    Ok(Json(ServiceRequestResponse::from(request)))
}

// ---------------------------------------------------------------------------
// PATCH /api/requests/{id}/status
// ---------------------------------------------------------------------------

/// Move a request through its lifecycle.
///
/// Either side may cancel; every other transition belongs to the provider.
#[utoipa::path(
    patch,
    path = "/api/requests/{id}/status",
    params(("id" = String, Path, description = "Request UUID")),
    request_body = UpdateRequestStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ServiceRequestResponse),
        (status = 403, description = "Only the provider may make this change", body = AppError),
        (status = 409, description = "Transition not allowed", body = AppError)
    ),
    tag = "requests"
)]
#[tracing::instrument(skip(pool, claims, provider, body), fields(next = body.status.as_str()))]
pub async fn update_status(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequestStatusRequest>,
) -> Result<Json<ServiceRequestResponse>, AppError> {
    let (request, party) = load_for_party(&pool, &id, Some(&claims), provider).await?;

    let current = request
        .status()
        .ok_or_else(|| AppError::internal(format!("Request has unknown status {}", request.status)))?;
    let next = body.status;

    if !current.can_transition_to(next) {
        return Err(AppError::conflict(format!(
            "Cannot move a request from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    if next != RequestStatus::Cancelled && matches!(party, Party::Subscriber(_)) {
        return Err(AppError::forbidden("Only the provider can make this change"));
    }

    let updated = crate::repo::requests::update_status(&pool, request.id, current, next)
        .await?
        .ok_or_else(|| AppError::conflict("Request status changed; reload and try again"))?;

    let request_provider = ProviderRef {
        provider_type: shared_types::ProviderType::parse(&updated.provider_type)
            .ok_or_else(|| AppError::internal("Request has unknown provider type"))?,
        provider_id: updated.provider_id,
    };
    let link = format!("/requests/{}", updated.id);
    let title = format!("Request {}", next.as_str().replace('_', " "));

    // The transition is committed; notices are best-effort from here.
    let notified = match party {
        Party::Provider(_) => crate::repo::notifications::insert(
            &pool,
            &NewNotification {
                user_id: updated.subscriber_id,
                title,
                body: updated.title.clone(),
                kind: "request.status",
                link: Some(link),
            },
        )
        .await
        .map(|_| ()),
        Party::Subscriber(_) => crate::repo::notifications::notify_provider(
            &pool,
            request_provider,
            &title,
            &updated.title,
            "request.status",
            Some(&link),
        )
        .await
        .map(|_| ()),
    };
    if let Err(e) = notified {
        tracing::warn!(request_id = %updated.id, error = %e.message, "Status notification failed");
    }

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: Some(request_provider),
            action: "request.status",
            entity_type: "service_request",
            entity_id: updated.id.to_string(),
            details: serde_json::json!({
                "from": current.as_str(),
                "to": next.as_str(),
                "by": party.role(),
                "note": body.note,
            }),
        },
    )
    .await;

    Ok(Json(ServiceRequestResponse::from(updated)))
}
