use axum::{extract::State, Json};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, MessageResponse, SendOtpRequest, VerifyOtpRequest, VerifyOtpResponse};

use crate::auth::extractors::MaybeAuth;

// ---------------------------------------------------------------------------
// POST /api/otp/send
// ---------------------------------------------------------------------------

/// Send a six-digit verification code by SMS or email.
#[utoipa::path(
    post,
    path = "/api/otp/send",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 422, description = "Invalid destination", body = AppError),
        (status = 429, description = "Too many codes requested", body = AppError)
    ),
    tag = "otp"
)]
pub async fn send_otp(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    crate::otp::send(&pool, &body).await?;
    Ok(Json(MessageResponse::new("Verification code sent")))
}

// ---------------------------------------------------------------------------
// POST /api/otp/verify
// ---------------------------------------------------------------------------

/// Check a verification code.
#[utoipa::path(
    post,
    path = "/api/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyOtpResponse),
        (status = 422, description = "Wrong or malformed code", body = AppError),
        (status = 429, description = "Too many attempts", body = AppError)
    ),
    tag = "otp"
)]
pub async fn verify_otp(
    State(pool): State<Pool<Postgres>>,
    MaybeAuth(claims): MaybeAuth,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    let response = crate::otp::verify(&pool, claims.as_ref(), &body).await?;
    Ok(Json(response))
}
