use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{Pool, Postgres};

use shared_types::{
    parse_referral_code, referral_code, AddMemberRequest, AppError, Member, MessageResponse,
    RedeemReferralRequest, RedeemReferralResponse, ReferralCodeResponse, SubscribeRequest,
    Subscription, SubscriptionPlan, UserPoints, REFERRED_POINTS,
};

use crate::auth::extractors::AuthRequired;
use crate::rest::parse_uuid;

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Start a subscription now. Any active subscription is replaced.
#[utoipa::path(
    post,
    path = "/api/membership/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed", body = Subscription),
        (status = 422, description = "Invalid period", body = AppError)
    ),
    tag = "membership"
)]
pub async fn subscribe(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    let starts_at = Utc::now();
    let ends_at = body.period_end(starts_at)?;
    let sub = crate::repo::membership::subscribe(&pool, claims.sub, body.plan, starts_at, ends_at).await?;
    tracing::info!(user_id = claims.sub, plan = body.plan.as_str(), "Subscription started");
    Ok((StatusCode::CREATED, Json(sub)))
}

#[utoipa::path(
    get,
    path = "/api/membership",
    responses(
        (status = 200, description = "Active subscription", body = Subscription),
        (status = 404, description = "No active subscription", body = AppError)
    ),
    tag = "membership"
)]
pub async fn current_subscription(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<Subscription>, AppError> {
    crate::repo::membership::current(&pool, claims.sub)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("No active subscription"))
}

// ---------------------------------------------------------------------------
// Family members
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/membership/members",
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = Member),
        (status = 409, description = "No active family plan or plan is full", body = AppError)
    ),
    tag = "membership"
)]
pub async fn add_member(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    if body.full_name.trim().is_empty() {
        return Err(AppError::invalid_field("full_name", "Full name is required"));
    }
    if body.relation.trim().is_empty() {
        return Err(AppError::invalid_field("relation", "Relation is required"));
    }

    let sub = crate::repo::membership::current(&pool, claims.sub)
        .await?
        .filter(|s| s.plan == SubscriptionPlan::Family.as_str())
        .ok_or_else(|| AppError::conflict("Members require an active family plan"))?;

    let member = crate::repo::membership::add_member(&pool, claims.sub, sub.id, &body).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/api/membership/members",
    responses((status = 200, description = "Members", body = Vec<Member>)),
    tag = "membership"
)]
pub async fn list_members(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(crate::repo::membership::list_members(&pool, claims.sub).await?))
}

#[utoipa::path(
    delete,
    path = "/api/membership/members/{id}",
    params(("id" = String, Path, description = "Member UUID")),
    responses(
        (status = 200, description = "Member removed", body = MessageResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "membership"
)]
pub async fn remove_member(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_uuid(&id, "id")?;
    if !crate::repo::membership::remove_member(&pool, claims.sub, id).await? {
        return Err(AppError::not_found(format!("Member {id} not found")));
    }
    Ok(Json(MessageResponse::new("Member removed")))
}

// ---------------------------------------------------------------------------
// Points and referrals
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/membership/points",
    responses((status = 200, description = "Points balance", body = UserPoints)),
    tag = "membership"
)]
pub async fn get_points(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<UserPoints>, AppError> {
    Ok(Json(crate::repo::membership::points(&pool, claims.sub).await?))
}

#[utoipa::path(
    get,
    path = "/api/membership/referral-code",
    responses((status = 200, description = "Caller's referral code", body = ReferralCodeResponse)),
    tag = "membership"
)]
pub async fn my_referral_code(AuthRequired(claims): AuthRequired) -> Json<ReferralCodeResponse> {
    Json(ReferralCodeResponse {
        code: referral_code(claims.sub),
    })
}

/// Redeem someone else's code. Each account can redeem once.
#[utoipa::path(
    post,
    path = "/api/membership/referrals/redeem",
    request_body = RedeemReferralRequest,
    responses(
        (status = 200, description = "Points credited", body = RedeemReferralResponse),
        (status = 404, description = "Unknown code", body = AppError),
        (status = 409, description = "Already redeemed", body = AppError),
        (status = 422, description = "Malformed or own code", body = AppError)
    ),
    tag = "membership"
)]
pub async fn redeem_referral(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<RedeemReferralRequest>,
) -> Result<Json<RedeemReferralResponse>, AppError> {
    let referrer_id = parse_referral_code(&body.code)
        .ok_or_else(|| AppError::invalid_field("code", "Invalid referral code"))?;
    if referrer_id == claims.sub {
        return Err(AppError::invalid_field("code", "You cannot redeem your own code"));
    }

    crate::repo::users::find_by_id(&pool, referrer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Referral code not found"))?;

    let points = crate::repo::membership::redeem_referral(&pool, referrer_id, claims.sub).await?;
    Ok(Json(RedeemReferralResponse {
        referrer_id,
        points_awarded: REFERRED_POINTS,
        points,
    }))
}
