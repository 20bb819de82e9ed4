use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use crate::common::{self, subscriber_token, As, SUBSCRIBER_ID};

const PHONE: &str = "+966501234567";

async fn send(app: &axum::Router, destination: &str) -> StatusCode {
    let body = json!({ "destination": destination, "channel": "sms" });
    common::post_json(app, "/api/otp/send", &body, As::Anonymous).await.0
}

/// Codes are random and only their hash is stored, so tests pin a known one.
async fn pin_code(pool: &PgPool, destination: &str, code: &str) {
    sqlx::query("UPDATE otp_codes SET code_hash = $2 WHERE destination = $1")
        .bind(destination)
        .bind(server::otp::hash_code(code))
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn send_stores_hashed_code() {
    let (app, pool, _guard) = common::test_app().await;
    assert_eq!(send(&app, "+966 50-123-4567").await, StatusCode::OK);

    let (destination, hash): (String, String) =
        sqlx::query_as("SELECT destination, code_hash FROM otp_codes")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(destination, PHONE);
    assert_eq!(hash.len(), 64);
}

#[tokio::test]
async fn verify_with_session_marks_phone() {
    let (app, pool, _guard) = common::test_app().await;
    send(&app, PHONE).await;
    pin_code(&pool, PHONE, "123456").await;

    let token = subscriber_token();
    let body = json!({ "destination": PHONE, "code": "123456" });
    let (status, response) = common::post_json(&app, "/api/otp/verify", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response["verified"], true);
    assert_eq!(response["phone_verified"], true);

    let (phone, verified): (Option<String>, bool) =
        sqlx::query_as("SELECT phone, phone_verified FROM users WHERE id = $1")
            .bind(SUBSCRIBER_ID)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(phone.as_deref(), Some(PHONE));
    assert!(verified);

    let (status, _) = common::post_json(&app, "/api/otp/verify", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "A used code is no longer pending");
}

#[tokio::test]
async fn anonymous_verify_does_not_touch_users() {
    let (app, pool, _guard) = common::test_app().await;
    send(&app, PHONE).await;
    pin_code(&pool, PHONE, "222222").await;

    let body = json!({ "destination": PHONE, "code": "222222" });
    let (status, response) = common::post_json(&app, "/api/otp/verify", &body, As::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["verified"], true);
    assert_eq!(response["phone_verified"], false);
}

#[tokio::test]
async fn wrong_and_malformed_codes() {
    let (app, pool, _guard) = common::test_app().await;
    send(&app, PHONE).await;
    pin_code(&pool, PHONE, "123456").await;

    for code in ["12345", "abcdef", "1234567"] {
        let body = json!({ "destination": PHONE, "code": code });
        let (status, _) = common::post_json(&app, "/api/otp/verify", &body, As::Anonymous).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "code {code}");
    }

    let body = json!({ "destination": PHONE, "code": "654321" });
    let (status, response) = common::post_json(&app, "/api/otp/verify", &body, As::Anonymous).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["field_errors"]["code"], "Invalid verification code");
}

#[tokio::test]
async fn attempts_are_capped() {
    let (app, pool, _guard) = common::test_app().await;
    send(&app, PHONE).await;
    pin_code(&pool, PHONE, "123456").await;

    let wrong = json!({ "destination": PHONE, "code": "000000" });
    for _ in 0..5 {
        let (status, _) = common::post_json(&app, "/api/otp/verify", &wrong, As::Anonymous).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let right = json!({ "destination": PHONE, "code": "123456" });
    let (status, response) = common::post_json(&app, "/api/otp/verify", &right, As::Anonymous).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response["kind"], "RateLimited");
}

#[tokio::test]
async fn sends_are_limited_per_hour() {
    let (app, _pool, _guard) = common::test_app().await;
    for _ in 0..3 {
        assert_eq!(send(&app, PHONE).await, StatusCode::OK);
    }
    assert_eq!(send(&app, PHONE).await, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(send(&app, "+966509999999").await, StatusCode::OK);
}

#[tokio::test]
async fn concurrent_wrong_guesses_stop_at_the_cap() {
    let (app, pool, _guard) = common::test_app().await;
    send(&app, PHONE).await;
    pin_code(&pool, PHONE, "123456").await;

    let wrong = json!({ "destination": PHONE, "code": "000000" });
    let mut guesses = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let app = app.clone();
        let wrong = wrong.clone();
        guesses.spawn(async move {
            common::post_json(&app, "/api/otp/verify", &wrong, As::Anonymous).await.0
        });
    }
    let mut refused = 0;
    while let Some(status) = guesses.join_next().await {
        if status.unwrap() == StatusCode::TOO_MANY_REQUESTS {
            refused += 1;
        }
    }
    assert_eq!(refused, 7);

    let attempts: i32 = sqlx::query_scalar("SELECT attempts FROM otp_codes WHERE destination = $1")
        .bind(PHONE)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(attempts, 5);
}

#[tokio::test]
async fn concurrent_sends_respect_the_hourly_limit() {
    let (app, pool, _guard) = common::test_app().await;
    let mut sends = tokio::task::JoinSet::new();
    for _ in 0..6 {
        let app = app.clone();
        sends.spawn(async move { send(&app, PHONE).await });
    }
    let mut accepted = 0;
    while let Some(status) = sends.join_next().await {
        if status.unwrap() == StatusCode::OK {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 3);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM otp_codes WHERE destination = $1")
        .bind(PHONE)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 3);
}

#[tokio::test]
async fn destination_must_match_channel() {
    let (app, _pool, _guard) = common::test_app().await;
    let body = json!({ "destination": "someone@test.sa", "channel": "sms" });
    let (status, response) = common::post_json(&app, "/api/otp/send", &body, As::Anonymous).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["destination"].is_string());

    let body = json!({ "destination": "Someone@Test.sa", "channel": "email" });
    let (status, _) = common::post_json(&app, "/api/otp/send", &body, As::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
}
