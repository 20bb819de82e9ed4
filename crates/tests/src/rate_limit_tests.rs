use axum::http::StatusCode;
use crate::common::{self, other_partner, partner, As};

#[tokio::test]
async fn test_rate_limit_returns_429_when_exceeded() {
    // Allow only 2 requests per 60s window
    let (app, _pool, _guard) = common::test_app_rate_limited(2).await;

    let (s1, _) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert_eq!(s1, StatusCode::OK, "First request should pass");

    let (s2, _) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert_eq!(s2, StatusCode::OK, "Second request should pass");

    let (s3, body) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS, "Third request should be rate limited");
    assert_eq!(body["kind"], "RateLimited");
}

#[tokio::test]
async fn test_rate_limit_separate_keys() {
    // Allow only 1 request per key
    let (app, _pool, _guard) = common::test_app_rate_limited(1).await;

    let (s1, _) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert_eq!(s1, StatusCode::OK);

    // Different provider, different bucket
    let (s2, _) = common::get(&app, "/api/provider-services", As::Provider(other_partner())).await;
    assert_eq!(s2, StatusCode::OK);

    let (s3, _) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_keys_sessions_by_user() {
    let (app, _pool, _guard) = common::test_app_rate_limited(1).await;
    let first = common::subscriber_token();
    let second = common::other_subscriber_token();

    let (s1, _) = common::get(&app, "/api/auth/me", As::Token(&first)).await;
    assert_eq!(s1, StatusCode::OK);
    let (s2, _) = common::get(&app, "/api/auth/me", As::Token(&second)).await;
    assert_eq!(s2, StatusCode::OK);
    let (s3, _) = common::get(&app, "/api/auth/me", As::Token(&first)).await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS);
}
