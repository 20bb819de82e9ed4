use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, MessageResponse, RegisterDeviceRequest, UpdateSettingsRequest, UserDevice,
    UserSettings,
};

use crate::auth::extractors::AuthRequired;
use crate::rest::parse_uuid;

const PLATFORMS: &[&str] = &["ios", "android", "web"];

/// Saved settings, or the defaults for a user who never saved any.
#[utoipa::path(
    get,
    path = "/api/settings",
    responses((status = 200, description = "Settings", body = UserSettings)),
    tag = "settings"
)]
pub async fn get_settings(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<UserSettings>, AppError> {
    let settings = crate::repo::settings::find(&pool, claims.sub)
        .await?
        .unwrap_or_else(|| UserSettings::defaults_for(claims.sub));
    Ok(Json(settings))
}

#[utoipa::path(
    patch,
    path = "/api/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = UserSettings),
        (status = 422, description = "Unknown language or theme", body = AppError)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<UserSettings>, AppError> {
    let current = crate::repo::settings::find(&pool, claims.sub)
        .await?
        .unwrap_or_else(|| UserSettings::defaults_for(claims.sub));
    let next = current.apply(body)?;
    Ok(Json(crate::repo::settings::upsert(&pool, &next).await?))
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = UserDevice),
        (status = 422, description = "Invalid device", body = AppError)
    ),
    tag = "settings"
)]
pub async fn register_device(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<UserDevice>), AppError> {
    let token = body.device_token.trim();
    if token.is_empty() {
        return Err(AppError::invalid_field("device_token", "Device token is required"));
    }
    if !PLATFORMS.contains(&body.platform.as_str()) {
        return Err(AppError::invalid_field("platform", "Platform must be ios, android or web"));
    }
    let device = crate::repo::settings::upsert_device(&pool, claims.sub, token, &body.platform).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

#[utoipa::path(
    get,
    path = "/api/devices",
    responses((status = 200, description = "Registered devices", body = Vec<UserDevice>)),
    tag = "settings"
)]
pub async fn list_devices(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<Vec<UserDevice>>, AppError> {
    Ok(Json(crate::repo::settings::list_devices(&pool, claims.sub).await?))
}

#[utoipa::path(
    delete,
    path = "/api/devices/{id}",
    params(("id" = String, Path, description = "Device UUID")),
    responses(
        (status = 200, description = "Device removed", body = MessageResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "settings"
)]
pub async fn delete_device(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_uuid(&id, "id")?;
    if !crate::repo::settings::delete_device(&pool, claims.sub, id).await? {
        return Err(AppError::not_found(format!("Device {id} not found")));
    }
    Ok(Json(MessageResponse::new("Device removed")))
}
