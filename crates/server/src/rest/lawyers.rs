use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, Lawyer, LawyerListParams, NewActivity, RegisterLawyerRequest,
    RegisterLawyerResponse, SetStatusRequest,
};

use crate::auth::extractors::AdminRequired;
use crate::auth::password::hash_for_storage;
use crate::error_convert::ValidateRequest;
use crate::rest::parse_uuid;

// ---------------------------------------------------------------------------
// POST /api/lawyers/register
// ---------------------------------------------------------------------------

/// Self-registration for lawyers. Creates the login account and the lawyer
/// profile together; joining a legal arm requires it to be active.
#[utoipa::path(
    post,
    path = "/api/lawyers/register",
    request_body = RegisterLawyerRequest,
    responses(
        (status = 201, description = "Lawyer registered", body = RegisterLawyerResponse),
        (status = 409, description = "Email or license already registered", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "lawyers"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn register_lawyer(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<RegisterLawyerRequest>,
) -> Result<(StatusCode, Json<RegisterLawyerResponse>), AppError> {
    body.validate_request()?;

    if let Some(arm_id) = body.legal_arm_id {
        if !crate::repo::organizations::legal_arm_is_active(&pool, arm_id).await? {
            return Err(AppError::invalid_field(
                "legal_arm_id",
                "Legal arm does not exist or is inactive",
            ));
        }
    }

    let password_hash = hash_for_storage(&body.password)?;
    let (user, lawyer) = crate::repo::lawyers::register(&pool, &body, &password_hash).await?;
    tracing::info!(user_id = user.id, lawyer_id = %lawyer.id, "Lawyer registered");

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(user.id),
            provider: None,
            action: "lawyer.register",
            entity_type: "lawyer",
            entity_id: lawyer.id.to_string(),
            details: serde_json::json!({ "legal_arm_id": lawyer.legal_arm_id }),
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterLawyerResponse {
            user_id: user.id,
            lawyer,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/lawyers",
    params(LawyerListParams),
    responses((status = 200, description = "Lawyers", body = Vec<Lawyer>)),
    tag = "lawyers"
)]
pub async fn list_lawyers(
    State(pool): State<Pool<Postgres>>,
    Query(params): Query<LawyerListParams>,
) -> Result<Json<Vec<Lawyer>>, AppError> {
    Ok(Json(crate::repo::lawyers::list(&pool, params.legal_arm_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/lawyers/{id}",
    params(("id" = String, Path, description = "Lawyer UUID")),
    responses(
        (status = 200, description = "Lawyer", body = Lawyer),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn get_lawyer(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Lawyer>, AppError> {
    let id = parse_uuid(&id, "id")?;
    crate::repo::lawyers::find(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Lawyer {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/admin/lawyers/{id}/status",
    params(("id" = String, Path, description = "Lawyer UUID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Lawyer),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "lawyers"
)]
pub async fn set_lawyer_status(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<Lawyer>, AppError> {
    let id = parse_uuid(&id, "id")?;
    if !body.is_valid() {
        return Err(AppError::invalid_field("status", "Status must be active or inactive"));
    }
    crate::repo::lawyers::set_status(&pool, id, &body.status)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Lawyer {id} not found")))
}
