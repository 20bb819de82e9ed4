use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, AuthResponse, LinkProviderRequest, LoginRequest, MessageResponse, ProviderRef,
    RegisterRequest, User, UserRow, AccountType,
};

use crate::auth::cookies::{clear_session_cookie, set_session_cookie};
use crate::auth::extractors::{AdminRequired, AuthRequired};
use crate::auth::jwt::{access_token_expiry_minutes, create_access_token};
use crate::auth::password::{credentials_match, hash_for_storage};
use crate::error_convert::ValidateRequest;

/// Sign a token for the user and set it as the session cookie.
fn issue_session(
    user: UserRow,
    provider: Option<ProviderRef>,
) -> Result<(HeaderMap, AuthResponse), AppError> {
    let token = create_access_token(user.id, &user.email, &user.account_type, provider).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign access token");
        AppError::internal("Could not create session")
    })?;

    let mut headers = HeaderMap::new();
    set_session_cookie(&mut headers, &token);

    Ok((
        headers,
        AuthResponse {
            user: User::from(user),
            access_token: token,
            expires_in_minutes: access_token_expiry_minutes(),
        },
    ))
}

// ---------------------------------------------------------------------------
// POST /api/auth/register
// ---------------------------------------------------------------------------

/// Register a subscriber account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, body), fields(email = %body.email))]
pub async fn register(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AppError> {
    body.validate_request()?;
    let hash = hash_for_storage(&body.password)?;

    let mut user = crate::repo::users::insert(
        &pool,
        &body.email,
        body.phone.as_deref(),
        &body.display_name,
        &hash,
        AccountType::Subscriber,
    )
    .await?;

    user.account_type =
        crate::auth::maybe_promote_admin(&pool, user.id, &user.email, user.account_type).await;

    tracing::info!(user_id = user.id, "Subscriber registered");
    let (headers, response) = issue_session(user, None)?;
    Ok((StatusCode::CREATED, headers, Json(response)))
}

// ---------------------------------------------------------------------------
// POST /api/auth/login
// ---------------------------------------------------------------------------

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, body))]
pub async fn login(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    body.validate_request()?;

    let invalid = || AppError::unauthorized("Invalid email or password");
    let mut user = crate::repo::users::find_by_email(&pool, &body.email)
        .await?
        .ok_or_else(invalid)?;

    if !credentials_match(&body.password, &user.password_hash) {
        return Err(invalid());
    }

    user.account_type =
        crate::auth::maybe_promote_admin(&pool, user.id, &user.email, user.account_type).await;
    let provider = crate::repo::users::provider_of(&pool, user.id).await?;

    let (headers, response) = issue_session(user, provider)?;
    Ok((headers, Json(response)))
}

// ---------------------------------------------------------------------------
// POST /api/auth/logout
// ---------------------------------------------------------------------------

/// Clear the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse)),
    tag = "auth"
)]
pub async fn logout() -> (HeaderMap, Json<MessageResponse>) {
    let mut headers = HeaderMap::new();
    clear_session_cookie(&mut headers);
    (headers, Json(MessageResponse::new("Logged out")))
}

// ---------------------------------------------------------------------------
// GET /api/auth/me
// ---------------------------------------------------------------------------

/// The authenticated user.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "auth"
)]
pub async fn me(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<User>, AppError> {
    let user = crate::repo::users::find_by_id(&pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;
    Ok(Json(User::from(user)))
}

// ---------------------------------------------------------------------------
// PUT /api/admin/users/{id}/provider
// ---------------------------------------------------------------------------

/// Attach a user to the provider they act for. Takes effect on next login.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/provider",
    params(("id" = i64, Path, description = "User ID")),
    request_body = LinkProviderRequest,
    responses(
        (status = 200, description = "User linked", body = User),
        (status = 400, description = "Account type does not match provider type", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError)
    ),
    tag = "auth"
)]
pub async fn link_provider(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(admin): AdminRequired,
    Path(user_id): Path<i64>,
    Json(body): Json<LinkProviderRequest>,
) -> Result<Json<User>, AppError> {
    if !body.is_consistent() {
        return Err(AppError::bad_request(format!(
            "Account type {} cannot act as provider type {}",
            body.account_type.as_str(),
            body.provider_type
        )));
    }

    let provider = ProviderRef {
        provider_type: body.provider_type,
        provider_id: body.provider_id,
    };
    let user = crate::repo::users::link_provider(&pool, user_id, body.account_type, provider).await?;

    crate::repo::activity::record(
        &pool,
        shared_types::NewActivity {
            actor_id: Some(admin.sub),
            provider: Some(provider),
            action: "user.link_provider",
            entity_type: "user",
            entity_id: user_id.to_string(),
            details: serde_json::json!({ "account_type": body.account_type.as_str() }),
        },
    )
    .await;

    Ok(Json(User::from(user)))
}
