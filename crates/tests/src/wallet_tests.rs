use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    self, admin_token, other_partner, partner, provider_token, subscriber_token, As,
};

const IBAN: &str = "SA03 8000 0000 6080 1016 7519";

#[tokio::test]
async fn balance_is_provider_share_of_completed_work() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1000.0).await;
    common::create_completed_request(&app, branch.service()).await;
    common::create_test_request(&app, branch.service(), "Still pending").await;

    let (status, balance) = common::get(&app, "/api/wallet", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["earned"], 300.0);
    assert_eq!(balance["withdrawn"], 0.0);
    assert_eq!(balance["available"], 300.0);

    let (_, theirs) = common::get(&app, "/api/wallet", As::Provider(other_partner())).await;
    assert_eq!(theirs["earned"], 0.0);
}

#[tokio::test]
async fn withdrawal_reduces_available_balance() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1000.0).await;
    common::create_completed_request(&app, branch.service()).await;

    let body = json!({ "amount": 200.0, "iban": IBAN, "account_holder": "Test Partner LLC" });
    let (status, withdrawal) =
        common::post_json(&app, "/api/wallet/withdrawals", &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::CREATED, "{withdrawal}");
    assert_eq!(withdrawal["status"], "pending");
    assert_eq!(withdrawal["iban"], "SA0380000000608010167519");

    let (_, balance) = common::get(&app, "/api/wallet", As::Provider(partner())).await;
    assert_eq!(balance["withdrawn"], 200.0);
    assert_eq!(balance["available"], 100.0);

    let over = json!({ "amount": 150.0, "iban": IBAN, "account_holder": "Test Partner LLC" });
    let (status, response) =
        common::post_json(&app, "/api/wallet/withdrawals", &over, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["kind"], "Conflict");

    let (_, list) =
        common::get(&app, "/api/wallet/withdrawals", As::Provider(partner())).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_withdrawals_return_to_balance() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1000.0).await;
    common::create_completed_request(&app, branch.service()).await;

    let body = json!({ "amount": 300.0, "iban": IBAN, "account_holder": "Test Partner LLC" });
    common::post_json(&app, "/api/wallet/withdrawals", &body, As::Provider(partner())).await;
    sqlx::query("UPDATE withdrawal_requests SET status = 'rejected'")
        .execute(&pool)
        .await
        .unwrap();

    let (_, balance) = common::get(&app, "/api/wallet", As::Provider(partner())).await;
    assert_eq!(balance["available"], 300.0);
}

#[tokio::test]
async fn withdrawal_validation() {
    let (app, _pool, _guard) = common::test_app().await;

    let body = json!({ "amount": 10.0, "iban": "GB29NWBK60161331926819", "account_holder": "X" });
    let (status, response) =
        common::post_json(&app, "/api/wallet/withdrawals", &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["field_errors"]["iban"], "IBAN must start with SA");

    let body = json!({ "amount": 10.0, "iban": "sa0380000000608010167519", "account_holder": "X" });
    let (status, response) =
        common::post_json(&app, "/api/wallet/withdrawals", &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["field_errors"]["iban"], "IBAN must start with SA");

    let body = json!({ "amount": 0.0, "iban": IBAN, "account_holder": "X" });
    let (status, response) =
        common::post_json(&app, "/api/wallet/withdrawals", &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["amount"].is_string());
}

#[tokio::test]
async fn withdrawals_need_a_session_linked_to_the_provider() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1000.0).await;
    common::create_completed_request(&app, branch.service()).await;

    let body = json!({ "amount": 300.0, "iban": IBAN, "account_holder": "Somebody Else" });

    let (status, response) =
        common::post_json(&app, "/api/wallet/withdrawals", &body, As::Headers(partner())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{response}");

    let subscriber = subscriber_token();
    let (status, _) = common::post_json(
        &app,
        "/api/wallet/withdrawals",
        &body,
        As::Acting(&subscriber, partner()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let foreign = provider_token(other_partner());
    let (status, _) = common::post_json(
        &app,
        "/api/wallet/withdrawals",
        &body,
        As::Acting(&foreign, partner()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::get(&app, "/api/wallet", As::Headers(partner())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, balance) = common::get(&app, "/api/wallet", As::Provider(partner())).await;
    assert_eq!(balance["withdrawn"], 0.0);
    assert_eq!(balance["available"], 300.0);

    let admin = admin_token();
    let (status, balance) = common::get(&app, "/api/wallet", As::Acting(&admin, partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["earned"], 300.0);
}

#[tokio::test]
async fn withdrawal_survives_a_failed_notification() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1000.0).await;
    common::create_completed_request(&app, branch.service()).await;
    common::break_notifications(&pool).await;

    let body = json!({ "amount": 100.0, "iban": IBAN, "account_holder": "Test Partner LLC" });
    let (status, withdrawal) =
        common::post_json(&app, "/api/wallet/withdrawals", &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::CREATED, "{withdrawal}");

    let (_, list) = common::get(&app, "/api/wallet/withdrawals", As::Provider(partner())).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    let (_, balance) = common::get(&app, "/api/wallet", As::Provider(partner())).await;
    assert_eq!(balance["available"], 200.0);
}
