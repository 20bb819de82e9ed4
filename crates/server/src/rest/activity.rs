use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, ActivityListParams, ActivityLog, AppError, PageParams, PaginatedResponse,
};

use crate::auth::extractors::{AdminRequired, AuthRequired};

#[utoipa::path(
    get,
    path = "/api/activity",
    params(PageParams),
    responses((status = 200, description = "Caller's activity", body = PaginatedResponse<ActivityLog>)),
    tag = "activity"
)]
pub async fn my_activity(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<ActivityLog>>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit);
    let (rows, total) = crate::repo::activity::list_for_actor(&pool, claims.sub, page, limit).await?;
    Ok(Json(PaginatedResponse::new(rows, page, limit, total)))
}

#[utoipa::path(
    get,
    path = "/api/admin/activity",
    params(ActivityListParams),
    responses(
        (status = 200, description = "Activity log", body = PaginatedResponse<ActivityLog>),
        (status = 403, description = "Admin account required", body = AppError)
    ),
    tag = "activity"
)]
pub async fn all_activity(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Query(params): Query<ActivityListParams>,
) -> Result<Json<PaginatedResponse<ActivityLog>>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit);
    let (rows, total) = crate::repo::activity::list_all(
        &pool,
        params.entity_type.as_deref(),
        params.entity_id.as_deref(),
        page,
        limit,
    )
    .await?;
    Ok(Json(PaginatedResponse::new(rows, page, limit, total)))
}
