use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    self, other_partner, other_subscriber_token, partner, provider_token, subscriber_token, As,
    PARTNER_ID, PARTNER_USER_ID, SUBSCRIBER_ID,
};

#[tokio::test]
async fn fixed_price_is_quoted_on_creation() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1200.0).await;

    let request = common::create_test_request(&app, branch.service(), "Custody advice").await;
    assert_eq!(request["status"], "pending");
    assert_eq!(request["priority"], "normal");
    assert_eq!(request["quoted_price"], 1200.0);
    assert_eq!(request["subscriber_id"], SUBSCRIBER_ID);
    assert_eq!(request["provider_id"], PARTNER_ID.to_string());
    assert_eq!(request["overdue"], false);

    let rate: i32 = sqlx::query_scalar("SELECT commission_rate FROM service_requests")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rate, 70);
}

#[tokio::test]
async fn provider_is_notified_of_new_request() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    common::create_test_request(&app, branch.service(), "Notify me").await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(PARTNER_USER_ID)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn quote_priced_request_has_no_price() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Labour", 1).await;
    let uri = format!("/api/provider-services/{}", branch.service());
    common::put_json(&app, &uri, &json!({ "pricing_type": "quote" }), As::Provider(partner())).await;

    let request = common::create_test_request(&app, branch.service(), "Need a quote").await;
    assert!(request.get("quoted_price").is_none());
}

#[tokio::test]
async fn request_needs_an_active_offer() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    let token = subscriber_token();
    let body = json!({
        "service_id": branch.service(),
        "provider_type": "partner",
        "provider_id": PARTNER_ID,
        "title": "Not offered",
    });

    let (status, _) = common::post_json(&app, "/api/requests", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::enable_fixed(&app, branch.service(), 100.0).await;
    let uri = format!("/api/provider-services/{}", branch.service());
    common::delete(&app, &uri, As::Provider(partner())).await;

    let (status, _) = common::post_json(&app, "/api/requests", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "Disabled offers cannot be requested");
}

#[tokio::test]
async fn request_requires_login_and_title() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let mut body = json!({
        "service_id": branch.service(),
        "provider_type": "partner",
        "provider_id": PARTNER_ID,
        "title": "",
    });

    let (status, _) = common::post_json(&app, "/api/requests", &body, As::Anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = subscriber_token();
    let (status, response) = common::post_json(&app, "/api/requests", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["title"].is_string());

    body["title"] = json!("Valid");
    body["priority"] = json!("urgent");
    let (status, response) = common::post_json(&app, "/api/requests", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["priority"], "urgent");
}

#[tokio::test]
async fn lifecycle_follows_allowed_transitions() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let request = common::create_test_request(&app, branch.service(), "Lifecycle").await;
    let id = request["id"].as_str().unwrap();

    let (status, response) = common::set_request_status(&app, id, "completed").await;
    assert_eq!(status, StatusCode::CONFLICT, "pending -> completed must fail: {response}");

    for next in ["accepted", "in_progress", "completed"] {
        let (status, response) = common::set_request_status(&app, id, next).await;
        assert_eq!(status, StatusCode::OK, "{next}: {response}");
        assert_eq!(response["status"], next);
    }

    let (status, _) = common::set_request_status(&app, id, "cancelled").await;
    assert_eq!(status, StatusCode::CONFLICT, "completed is terminal");
}

#[tokio::test]
async fn subscriber_may_only_cancel() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let request = common::create_test_request(&app, branch.service(), "Cancel me").await;
    let uri = format!("/api/requests/{}/status", request["id"].as_str().unwrap());
    let token = subscriber_token();

    let (status, _) =
        common::patch_json(&app, &uri, &json!({ "status": "accepted" }), As::Token(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, response) =
        common::patch_json(&app, &uri, &json!({ "status": "cancelled" }), As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "cancelled");
}

#[tokio::test]
async fn strangers_cannot_see_requests() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let request = common::create_test_request(&app, branch.service(), "Private").await;
    let uri = format!("/api/requests/{}", request["id"].as_str().unwrap());

    let (status, _) = common::get(&app, &uri, As::Anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = other_subscriber_token();
    let (status, _) = common::get(&app, &uri, As::Token(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::get(&app, &uri, As::Provider(other_partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let token = subscriber_token();
    let (status, _) = common::get(&app, &uri, As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::get(&app, &uri, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn listings_per_side_with_status_filter() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let first = common::create_test_request(&app, branch.service(), "First").await;
    common::create_test_request(&app, branch.service(), "Second").await;
    common::set_request_status(&app, first["id"].as_str().unwrap(), "accepted").await;

    let token = subscriber_token();
    let (status, mine) = common::get(&app, "/api/requests/mine", As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let token = other_subscriber_token();
    let (_, theirs) = common::get(&app, "/api/requests/mine", As::Token(&token)).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (_, accepted) = common::get(
        &app,
        "/api/provider/requests?status=accepted",
        As::Provider(partner()),
    )
    .await;
    let accepted = accepted.as_array().unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0]["title"], "First");

    let (status, _) =
        common::get(&app, "/api/provider/requests?status=bogus", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overdue_lists_only_open_breaches() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let late = common::create_test_request(&app, branch.service(), "Late").await;
    let done = common::create_completed_request(&app, branch.service()).await;
    common::create_test_request(&app, branch.service(), "On time").await;

    sqlx::query("UPDATE service_requests SET sla_deadline = NOW() - INTERVAL '1 hour' WHERE id = ANY($1)")
        .bind(vec![
            uuid::Uuid::parse_str(late["id"].as_str().unwrap()).unwrap(),
            uuid::Uuid::parse_str(done["id"].as_str().unwrap()).unwrap(),
        ])
        .execute(&pool)
        .await
        .unwrap();

    let (status, overdue) =
        common::get(&app, "/api/provider/requests/overdue", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    let overdue = overdue.as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["id"], late["id"]);
    assert_eq!(overdue[0]["overdue"], true);
}

#[tokio::test]
async fn status_changes_need_the_providers_session() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let request = common::create_test_request(&app, branch.service(), "Guarded").await;
    let uri = format!("/api/requests/{}/status", request["id"].as_str().unwrap());
    let accept = json!({ "status": "accepted" });

    let (status, _) = common::patch_json(&app, &uri, &accept, As::Headers(partner())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = provider_token(other_partner());
    let (status, _) = common::patch_json(&app, &uri, &accept, As::Acting(&foreign, partner())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = common::patch_json(&app, &uri, &accept, As::Provider(other_partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let stranger = other_subscriber_token();
    let (status, _) = common::patch_json(&app, &uri, &accept, As::Acting(&stranger, partner())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, current) = common::get(
        &app,
        &format!("/api/requests/{}", request["id"].as_str().unwrap()),
        As::Provider(partner()),
    )
    .await;
    assert_eq!(current["status"], "pending");
}

#[tokio::test]
async fn status_change_survives_a_failed_notification() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let request = common::create_test_request(&app, branch.service(), "Quiet").await;
    common::break_notifications(&pool).await;

    let id = request["id"].as_str().unwrap();
    let (status, body) = common::set_request_status(&app, id, "accepted").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "accepted");

    let (status, _) = common::set_request_status(&app, id, "accepted").await;
    assert_eq!(status, StatusCode::CONFLICT);
}
