use axum::{extract::State, http::StatusCode, Json};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, CreateWithdrawalRequest, NewActivity, WalletBalance, WithdrawalRequest};

use crate::auth::extractors::AuthRequired;
use crate::provider::ProviderScope;

/// Earnings from completed requests net of commission, less withdrawals.
#[utoipa::path(
    get,
    path = "/api/wallet",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Wallet balance", body = WalletBalance)),
    tag = "wallet"
)]
pub async fn get_balance(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
) -> Result<Json<WalletBalance>, AppError> {
    Ok(Json(crate::repo::wallet::balance(&pool, scope.0).await?))
}

#[utoipa::path(
    post,
    path = "/api/wallet/withdrawals",
    request_body = CreateWithdrawalRequest,
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 201, description = "Withdrawal requested", body = WithdrawalRequest),
        (status = 401, description = "No session", body = AppError),
        (status = 403, description = "Session not linked to this provider", body = AppError),
        (status = 409, description = "Insufficient balance", body = AppError),
        (status = 422, description = "Invalid IBAN or amount", body = AppError)
    ),
    tag = "wallet"
)]
#[tracing::instrument(skip(pool, claims, scope, body), fields(provider = %scope.provider_id()))]
pub async fn request_withdrawal(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    scope: ProviderScope,
    Json(body): Json<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalRequest>), AppError> {
    let iban = body.check()?;
    let row = crate::repo::wallet::request_withdrawal(
        &pool,
        scope.0,
        body.amount,
        &iban,
        &body.account_holder,
    )
    .await?;

    // The withdrawal is committed; a failed notice must not turn it into a 500.
    if let Err(e) = crate::repo::notifications::notify_provider(
        &pool,
        scope.0,
        "Withdrawal requested",
        &format!("{:.2} SAR to {}", row.amount, row.iban),
        "wallet.withdrawal",
        Some("/wallet"),
    )
    .await
    {
        tracing::warn!(withdrawal_id = %row.id, error = %e.message, "Withdrawal notification failed");
    }

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: Some(scope.0),
            action: "wallet.withdrawal",
            entity_type: "withdrawal_request",
            entity_id: row.id.to_string(),
            details: serde_json::json!({ "amount": row.amount }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/api/wallet/withdrawals",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Withdrawals, newest first", body = Vec<WithdrawalRequest>)),
    tag = "wallet"
)]
pub async fn list_withdrawals(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
) -> Result<Json<Vec<WithdrawalRequest>>, AppError> {
    Ok(Json(crate::repo::wallet::list_withdrawals(&pool, scope.0).await?))
}
