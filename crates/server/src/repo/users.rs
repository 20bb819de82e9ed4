use shared_types::{AccountType, AppError, ProviderRef, ProviderType, UserRow};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

/// Insert a user. Accepts any executor so it can run inside a transaction.
pub async fn insert<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    email: &str,
    phone: Option<&str>,
    display_name: &str,
    password_hash: &str,
    account_type: AccountType,
) -> Result<UserRow, AppError> {
    sqlx::query_as!(
        UserRow,
        r#"
        INSERT INTO users (email, phone, display_name, password_hash, account_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, phone, display_name, password_hash, account_type, phone_verified, created_at
        "#,
        email.trim().to_lowercase(),
        phone,
        display_name.trim(),
        password_hash,
        account_type.as_str(),
    )
    .fetch_one(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<UserRow>, AppError> {
    sqlx::query_as!(
        UserRow,
        r#"
        SELECT id, email, phone, display_name, password_hash, account_type, phone_verified, created_at
        FROM users
        WHERE email = $1
        "#,
        email.trim().to_lowercase(),
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<UserRow>, AppError> {
    sqlx::query_as!(
        UserRow,
        r#"
        SELECT id, email, phone, display_name, password_hash, account_type, phone_verified, created_at
        FROM users
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// The provider a user acts for, if one has been linked.
pub async fn provider_of(pool: &Pool<Postgres>, user_id: i64) -> Result<Option<ProviderRef>, AppError> {
    let row = sqlx::query!(
        "SELECT provider_type, provider_id FROM users WHERE id = $1",
        user_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row.and_then(|r| match (r.provider_type, r.provider_id) {
        (Some(t), Some(provider_id)) => ProviderType::parse(&t).map(|provider_type| ProviderRef {
            provider_type,
            provider_id,
        }),
        _ => None,
    }))
}

/// Attach a user to a provider and set the matching account type.
pub async fn link_provider<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    user_id: i64,
    account_type: AccountType,
    provider: ProviderRef,
) -> Result<UserRow, AppError> {
    sqlx::query_as!(
        UserRow,
        r#"
        UPDATE users
        SET account_type = $2, provider_type = $3, provider_id = $4
        WHERE id = $1
        RETURNING id, email, phone, display_name, password_hash, account_type, phone_verified, created_at
        "#,
        user_id,
        account_type.as_str(),
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_optional(executor)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
}

/// Record the phone as verified when it is (or becomes) the user's phone.
/// Returns false if the user already has a different phone on file.
pub async fn mark_phone_verified(
    pool: &Pool<Postgres>,
    user_id: i64,
    phone: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query!(
        r#"
        UPDATE users
        SET phone = $2, phone_verified = TRUE
        WHERE id = $1 AND (phone IS NULL OR phone = $2)
        "#,
        user_id,
        phone,
    )
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

/// Every user id acting for a provider.
pub async fn ids_for_provider(pool: &Pool<Postgres>, provider: ProviderRef) -> Result<Vec<i64>, AppError> {
    sqlx::query_scalar!(
        "SELECT id FROM users WHERE provider_type = $1 AND provider_id = $2 ORDER BY id",
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
