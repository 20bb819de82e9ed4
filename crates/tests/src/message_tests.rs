use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{
    self, other_partner, other_subscriber_token, partner, partner_token, subscriber_token, As,
};

async fn request_id(app: &axum::Router, pool: &sqlx::PgPool) -> String {
    let branch = common::create_catalog_branch(pool, "Family", 1).await;
    common::enable_fixed(app, branch.service(), 100.0).await;
    let request = common::create_test_request(app, branch.service(), "Chat").await;
    request["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn both_parties_exchange_messages() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;
    let uri = format!("/api/requests/{id}/messages");

    let subscriber = subscriber_token();
    let (status, first) =
        common::post_json(&app, &uri, &json!({ "body": "Hello" }), As::Token(&subscriber)).await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["sender_role"], "subscriber");

    let provider = partner_token();
    let (status, reply) =
        common::post_json(&app, &uri, &json!({ "body": "Welcome" }), As::Token(&provider)).await;
    assert_eq!(status, StatusCode::CREATED, "{reply}");
    assert_eq!(reply["sender_role"], "provider");

    let (status, thread) = common::get(&app, &uri, As::Token(&subscriber)).await;
    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["Hello", "Welcome"]);
}

#[tokio::test]
async fn polling_after_returns_only_newer() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;
    let uri = format!("/api/requests/{id}/messages");
    let token = subscriber_token();

    let (_, first) =
        common::post_json(&app, &uri, &json!({ "body": "one" }), As::Token(&token)).await;
    common::post_json(&app, &uri, &json!({ "body": "two" }), As::Token(&token)).await;

    let after = first["created_at"].as_str().unwrap().replace('+', "%2B");
    let (status, newer) = common::get(&app, &format!("{uri}?after={after}"), As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK, "{newer}");
    let newer = newer.as_array().unwrap();
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0]["body"], "two");
}

#[tokio::test]
async fn polling_cursor_breaks_timestamp_ties_by_id() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;
    let uri = format!("/api/requests/{id}/messages");
    let token = subscriber_token();

    for body in ["one", "two", "three"] {
        common::post_json(&app, &uri, &json!({ "body": body }), As::Token(&token)).await;
    }
    sqlx::query("UPDATE messages SET created_at = '2026-01-01T10:00:00Z'")
        .execute(&pool)
        .await
        .unwrap();

    let (_, thread) = common::get(&app, &uri, As::Token(&token)).await;
    let thread = thread.as_array().unwrap().clone();
    assert_eq!(thread.len(), 3);

    let cursor = &thread[0];
    let after = cursor["created_at"].as_str().unwrap().replace('+', "%2B");
    let after_id = cursor["id"].as_str().unwrap();
    let (status, newer) = common::get(
        &app,
        &format!("{uri}?after={after}&after_id={after_id}"),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{newer}");
    let ids: Vec<&str> = newer.as_array().unwrap().iter().map(|m| m["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![thread[1]["id"].as_str().unwrap(), thread[2]["id"].as_str().unwrap()]);

    let (_, none) = common::get(&app, &format!("{uri}?after={after}"), As::Token(&token)).await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn messages_need_login_and_party() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;
    let uri = format!("/api/requests/{id}/messages");

    let (status, _) =
        common::post_json(&app, &uri, &json!({ "body": "hi" }), As::Headers(partner())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "Provider headers alone are not a session");

    let token = other_subscriber_token();
    let (status, _) = common::get(&app, &uri, As::Token(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let token = subscriber_token();
    let (status, _) = common::post_json(&app, &uri, &json!({ "body": "" }), As::Token(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn attachments_disabled_without_s3() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;
    let token = subscriber_token();

    let body = json!({ "file_name": "contract.pdf", "content_type": "application/pdf" });
    let (status, response) = common::post_json(
        &app,
        &format!("/api/requests/{id}/attachments"),
        &body,
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "File attachments are not enabled");

    let (status, list) =
        common::get(&app, &format!("/api/requests/{id}/attachments"), As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Time logs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_logs_time_against_request() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;

    for minutes in [30, 45] {
        let body = json!({ "request_id": id, "minutes": minutes, "description": "Drafting" });
        let (status, entry) =
            common::post_json(&app, "/api/time-logs", &body, As::Provider(partner())).await;
        assert_eq!(status, StatusCode::CREATED, "{entry}");
    }

    let (status, list) = common::get(
        &app,
        &format!("/api/time-logs?request_id={id}"),
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["entries"].as_array().unwrap().len(), 2);
    assert_eq!(list["total_minutes"], 75);
}

#[tokio::test]
async fn time_log_rejects_bad_minutes_and_foreign_requests() {
    let (app, pool, _guard) = common::test_app().await;
    let id = request_id(&app, &pool).await;

    let body = json!({ "request_id": id, "minutes": 0, "description": "Nothing" });
    let (status, response) =
        common::post_json(&app, "/api/time-logs", &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["minutes"].is_string());

    let body = json!({ "request_id": id, "minutes": 10, "description": "Not mine" });
    let (status, _) =
        common::post_json(&app, "/api/time-logs", &body, As::Provider(other_partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
