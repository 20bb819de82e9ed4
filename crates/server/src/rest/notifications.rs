use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, MarkAllReadResponse, Notification, NotificationListParams, UnreadCountResponse,
};

use crate::auth::extractors::AuthRequired;
use crate::rest::parse_uuid;

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationListParams),
    responses((status = 200, description = "Newest first", body = Vec<Notification>)),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Query(params): Query<NotificationListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let rows = crate::repo::notifications::list(&pool, claims.sub, params.unread_only).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses((status = 200, description = "Unread count", body = UnreadCountResponse)),
    tag = "notifications"
)]
pub async fn unread_count(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = crate::repo::notifications::unread_count(&pool, claims.sub).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification UUID")),
    responses(
        (status = 200, description = "Marked read", body = Notification),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Notification>, AppError> {
    let id = parse_uuid(&id, "id")?;
    crate::repo::notifications::mark_read(&pool, claims.sub, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses((status = 200, description = "Marked read", body = MarkAllReadResponse)),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = crate::repo::notifications::mark_all_read(&pool, claims.sub).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
