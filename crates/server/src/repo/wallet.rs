use shared_types::{provider_share, AppError, ProviderRef, WalletBalance, WithdrawalRequest};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

async fn balance_with(
    conn: &mut sqlx::PgConnection,
    provider: ProviderRef,
) -> Result<WalletBalance, AppError> {
    let earned: f64 = crate::repo::requests::completed_earnings(&mut *conn, provider)
        .await?
        .into_iter()
        .map(|(price, rate)| provider_share(price, rate))
        .sum();

    let withdrawn = sqlx::query_scalar!(
        r#"
        SELECT COALESCE(SUM(amount), 0)::double precision AS "withdrawn!"
        FROM withdrawal_requests
        WHERE provider_type = $1 AND provider_id = $2 AND status <> 'rejected'
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(WalletBalance::new(earned, withdrawn))
}

pub async fn balance(pool: &Pool<Postgres>, provider: ProviderRef) -> Result<WalletBalance, AppError> {
    let mut conn = pool.acquire().await.map_err(SqlxErrorExt::into_app_error)?;
    balance_with(&mut *conn, provider).await
}

/// Insert a pending withdrawal if the balance covers it.
///
/// A transaction-scoped advisory lock on the provider serialises concurrent
/// withdrawals so the balance check and the insert see the same state.
pub async fn request_withdrawal(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    amount: f64,
    iban: &str,
    account_holder: &str,
) -> Result<WithdrawalRequest, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("wallet:{}:{}", provider.provider_type, provider.provider_id))
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let balance = balance_with(&mut *tx, provider).await?;
    if amount > balance.available {
        return Err(AppError::conflict(format!(
            "Insufficient balance: {:.2} available",
            balance.available
        )));
    }

    let row = sqlx::query_as!(
        WithdrawalRequest,
        r#"
        INSERT INTO withdrawal_requests (provider_type, provider_id, amount, iban, account_holder)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, provider_type, provider_id, amount, iban, account_holder, status, created_at
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        amount,
        iban,
        account_holder.trim(),
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(row)
}

pub async fn list_withdrawals(pool: &Pool<Postgres>, provider: ProviderRef) -> Result<Vec<WithdrawalRequest>, AppError> {
    sqlx::query_as!(
        WithdrawalRequest,
        r#"
        SELECT id, provider_type, provider_id, amount, iban, account_holder, status, created_at
        FROM withdrawal_requests
        WHERE provider_type = $1 AND provider_id = $2
        ORDER BY created_at DESC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
