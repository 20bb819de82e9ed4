use chrono::{DateTime, Utc};
use shared_types::{
    AddMemberRequest, AppError, Member, Subscription, SubscriptionPlan, UserPoints,
    MAX_FAMILY_MEMBERS, REFERRED_POINTS, REFERRER_POINTS,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Replace any active subscription with a new one.
pub async fn subscribe(
    pool: &Pool<Postgres>,
    user_id: i64,
    plan: SubscriptionPlan,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<Subscription, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query!(
        "UPDATE subscriptions SET status = 'replaced' WHERE user_id = $1 AND status = 'active'",
        user_id,
    )
    .execute(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let sub = sqlx::query_as!(
        Subscription,
        r#"
        INSERT INTO subscriptions (user_id, plan, starts_at, ends_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, plan, status, starts_at, ends_at, created_at
        "#,
        user_id,
        plan.as_str(),
        starts_at,
        ends_at,
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(sub)
}

/// The active subscription, if it has not run out.
pub async fn current(pool: &Pool<Postgres>, user_id: i64) -> Result<Option<Subscription>, AppError> {
    sqlx::query_as!(
        Subscription,
        r#"
        SELECT id, user_id, plan, status, starts_at, ends_at, created_at
        FROM subscriptions
        WHERE user_id = $1 AND status = 'active' AND ends_at > NOW()
        "#,
        user_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Add a family member. The subscription row is locked while counting so two
/// concurrent adds cannot both take the last seat.
pub async fn add_member(
    pool: &Pool<Postgres>,
    owner_id: i64,
    subscription_id: Uuid,
    req: &AddMemberRequest,
) -> Result<Member, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query!(
        "SELECT id FROM subscriptions WHERE id = $1 FOR UPDATE",
        subscription_id,
    )
    .fetch_optional(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let count = sqlx::query_scalar!(
        r#"SELECT COUNT(*) AS "count!" FROM members WHERE subscription_id = $1"#,
        subscription_id,
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if count >= MAX_FAMILY_MEMBERS {
        return Err(AppError::conflict(format!(
            "A family plan can have at most {MAX_FAMILY_MEMBERS} members"
        )));
    }

    let member = sqlx::query_as!(
        Member,
        r#"
        INSERT INTO members (subscription_id, owner_id, full_name, relation, national_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, subscription_id, owner_id, full_name, relation, national_id, created_at
        "#,
        subscription_id,
        owner_id,
        req.full_name.trim(),
        req.relation.trim(),
        req.national_id.as_deref(),
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(member)
}

pub async fn list_members(pool: &Pool<Postgres>, owner_id: i64) -> Result<Vec<Member>, AppError> {
    sqlx::query_as!(
        Member,
        r#"
        SELECT id, subscription_id, owner_id, full_name, relation, national_id, created_at
        FROM members
        WHERE owner_id = $1
        ORDER BY created_at
        "#,
        owner_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn remove_member(pool: &Pool<Postgres>, owner_id: i64, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query!(
        "DELETE FROM members WHERE id = $1 AND owner_id = $2",
        id,
        owner_id,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Points & referrals
// ---------------------------------------------------------------------------

/// Zero balance for a user who never earned points.
pub async fn points(pool: &Pool<Postgres>, user_id: i64) -> Result<UserPoints, AppError> {
    let row = sqlx::query_as!(
        UserPoints,
        "SELECT user_id, balance, lifetime FROM user_points WHERE user_id = $1",
        user_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row.unwrap_or(UserPoints {
        user_id,
        balance: 0,
        lifetime: 0,
    }))
}

async fn credit<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    user_id: i64,
    amount: i64,
) -> Result<UserPoints, AppError> {
    sqlx::query_as!(
        UserPoints,
        r#"
        INSERT INTO user_points (user_id, balance, lifetime)
        VALUES ($1, $2, $2)
        ON CONFLICT (user_id) DO UPDATE SET
            balance = user_points.balance + EXCLUDED.balance,
            lifetime = user_points.lifetime + EXCLUDED.lifetime
        RETURNING user_id, balance, lifetime
        "#,
        user_id,
        amount,
    )
    .fetch_one(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Record the referral and credit both sides. Returns the referred user's points.
///
/// The unique index on `referred_id` rejects a second redemption with 409.
pub async fn redeem_referral(
    pool: &Pool<Postgres>,
    referrer_id: i64,
    referred_id: i64,
) -> Result<UserPoints, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query!(
        "INSERT INTO referrals (referrer_id, referred_id) VALUES ($1, $2)",
        referrer_id,
        referred_id,
    )
    .execute(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    credit(&mut *tx, referrer_id, REFERRER_POINTS).await?;
    let mine = credit(&mut *tx, referred_id, REFERRED_POINTS).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(mine)
}
