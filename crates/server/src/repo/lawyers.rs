use shared_types::{AccountType, AppError, Lawyer, ProviderRef, RegisterLawyerRequest, UserRow};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Create the user and lawyer rows together, then link the user to the
/// lawyer as its provider. Any failure rolls back every insert.
pub async fn register(
    pool: &Pool<Postgres>,
    req: &RegisterLawyerRequest,
    password_hash: &str,
) -> Result<(UserRow, Lawyer), AppError> {
    let account_type = if req.legal_arm_id.is_some() {
        AccountType::LegalArmLawyer
    } else {
        AccountType::Lawyer
    };

    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let user = crate::repo::users::insert(
        &mut *tx,
        &req.email,
        req.phone.as_deref(),
        &req.display_name,
        password_hash,
        account_type,
    )
    .await?;

    let lawyer = sqlx::query_as!(
        Lawyer,
        r#"
        INSERT INTO lawyers (user_id, legal_arm_id, full_name, license_number, specialization)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, legal_arm_id, full_name, license_number, specialization, status, created_at
        "#,
        user.id,
        req.legal_arm_id,
        req.display_name.trim(),
        req.license_number.trim(),
        req.specialization.as_deref(),
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let provider = ProviderRef {
        provider_type: lawyer.provider_type(),
        provider_id: lawyer.id,
    };
    let user = crate::repo::users::link_provider(&mut *tx, user.id, account_type, provider).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok((user, lawyer))
}

pub async fn list(pool: &Pool<Postgres>, legal_arm_id: Option<Uuid>) -> Result<Vec<Lawyer>, AppError> {
    sqlx::query_as!(
        Lawyer,
        r#"
        SELECT id, user_id, legal_arm_id, full_name, license_number, specialization, status, created_at
        FROM lawyers
        WHERE ($1::uuid IS NULL OR legal_arm_id = $1)
        ORDER BY full_name
        "#,
        legal_arm_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Lawyer>, AppError> {
    sqlx::query_as!(
        Lawyer,
        r#"
        SELECT id, user_id, legal_arm_id, full_name, license_number, specialization, status, created_at
        FROM lawyers
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn set_status(pool: &Pool<Postgres>, id: Uuid, status: &str) -> Result<Option<Lawyer>, AppError> {
    sqlx::query_as!(
        Lawyer,
        r#"
        UPDATE lawyers
        SET status = $2
        WHERE id = $1
        RETURNING id, user_id, legal_arm_id, full_name, license_number, specialization, status, created_at
        "#,
        id,
        status,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
