use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    self, admin_token, legal_arm, other_partner, partner, partner_token, provider_token,
    subscriber_token, As,
};

#[tokio::test]
async fn enable_fixed_price_applies_partner_commission() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;

    let response = common::enable_fixed(&app, branch.service(), 1000.0).await;
    assert_eq!(response["pricing_type"], "fixed");
    assert_eq!(response["price"], 1000.0);
    assert_eq!(response["commission_rate"], 70);
    assert_eq!(response["commission"], 700.0);
    assert_eq!(response["is_active"], true);
}

#[tokio::test]
async fn legal_arm_gets_half_commission() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;

    let uri = format!("/api/provider-services/{}", branch.service());
    let body = json!({ "pricing_type": "fixed", "price": 400.0 });
    let (status, response) = common::put_json(&app, &uri, &body, As::Provider(legal_arm())).await;

    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response["commission_rate"], 50);
    assert_eq!(response["commission"], 200.0);
}

#[tokio::test]
async fn range_and_quote_pricing() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Labour", 2).await;

    let uri = format!("/api/provider-services/{}", branch.service_ids[0]);
    let body = json!({
        "pricing_type": "range",
        "min_price": 300.0,
        "max_price": 900.0,
        "estimated_duration": "  2 weeks  "
    });
    let (status, response) = common::put_json(&app, &uri, &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response["min_price"], 300.0);
    assert_eq!(response["max_price"], 900.0);
    assert_eq!(response["estimated_duration"], "2 weeks");
    assert!(response.get("commission").is_none());

    let uri = format!("/api/provider-services/{}", branch.service_ids[1]);
    let (status, response) =
        common::put_json(&app, &uri, &json!({ "pricing_type": "quote" }), As::Provider(partner()))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["pricing_type"], "quote");
    assert!(response.get("price").is_none());
}

#[tokio::test]
async fn invalid_pricing_is_rejected() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    let uri = format!("/api/provider-services/{}", branch.service());

    let (status, response) =
        common::put_json(&app, &uri, &json!({ "pricing_type": "fixed" }), As::Provider(partner()))
            .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["field_errors"]["price"], "Price is required");

    let body = json!({ "pricing_type": "range", "min_price": 500.0, "max_price": 500.0 });
    let (status, response) = common::put_json(&app, &uri, &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["max_price"].is_string());

    let (_, mine) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert!(mine.as_array().unwrap().is_empty(), "Nothing should be stored");
}

#[tokio::test]
async fn enable_unknown_service_returns_404() {
    let (app, _pool, _guard) = common::test_app().await;
    let uri = format!("/api/provider-services/{}", uuid::Uuid::new_v4());
    let (status, _) =
        common::put_json(&app, &uri, &json!({ "pricing_type": "quote" }), As::Provider(partner()))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn provider_endpoints_need_session_and_scope() {
    let (app, _pool, _guard) = common::test_app().await;
    let (status, response) = common::get(&app, "/api/provider-services", As::Anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["kind"], "Unauthorized");

    let token = subscriber_token();
    let (status, response) = common::get(&app, "/api/provider-services", As::Token(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["kind"], "BadRequest");
}

#[tokio::test]
async fn pricing_writes_refuse_unlinked_callers() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 2).await;
    let uri = format!("/api/provider-services/{}", branch.service());
    let body = json!({ "pricing_type": "fixed", "price": 1.0 });

    let (status, _) = common::put_json(&app, &uri, &body, As::Headers(partner())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = provider_token(other_partner());
    let (status, response) =
        common::put_json(&app, &uri, &body, As::Acting(&foreign, partner())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["kind"], "Forbidden");

    let subscriber = subscriber_token();
    let (status, _) = common::put_json(&app, &uri, &body, As::Acting(&subscriber, partner())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let bulk = json!({ "scope": "category", "id": branch.category_id });
    let (status, _) = common::post_json(
        &app,
        "/api/provider-services/bulk-enable",
        &bulk,
        As::Headers(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::enable_fixed(&app, branch.service(), 250.0).await;
    let (status, _) = common::delete(&app, &uri, As::Headers(partner())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = common::delete(&app, &uri, As::Acting(&foreign, partner())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, mine) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["price"], 250.0);
    assert_eq!(mine[0]["is_active"], true);
}

#[tokio::test]
async fn admin_may_price_on_behalf_of_a_provider() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    let uri = format!("/api/provider-services/{}", branch.service());
    let admin = admin_token();

    let (status, row) = common::put_json(
        &app,
        &uri,
        &json!({ "pricing_type": "fixed", "price": 90.0 }),
        As::Acting(&admin, other_partner()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{row}");

    let (_, theirs) = common::get(&app, "/api/provider-services", As::Provider(other_partner())).await;
    assert_eq!(theirs[0]["id"], row["id"]);
    let (_, mine) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn session_claims_carry_provider_scope() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 250.0).await;

    let token = partner_token();
    let (status, mine) = common::get(&app, "/api/provider-services", As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn disable_keeps_row_inactive() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 250.0).await;

    let uri = format!("/api/provider-services/{}", branch.service());
    let (status, response) = common::delete(&app, &uri, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["is_active"], false);
    assert_eq!(response["price"], 250.0);

    let (_, mine) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    assert_eq!(mine[0]["is_active"], false);

    // Re-enabling the same service updates the existing row.
    let response = common::enable_fixed(&app, branch.service(), 300.0).await;
    assert_eq!(response["id"], mine[0]["id"]);
    assert_eq!(response["is_active"], true);
}

#[tokio::test]
async fn disable_never_enabled_returns_404() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    let uri = format!("/api/provider-services/{}", branch.service());
    let (status, _) = common::delete(&app, &uri, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn providers_are_isolated() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 250.0).await;

    let (_, theirs) = common::get(&app, "/api/provider-services", As::Provider(other_partner())).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let uri = format!("/api/provider-services/{}", branch.service());
    let (status, _) = common::delete(&app, &uri, As::Provider(other_partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_enable_counts_existing_rows() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Commercial", 3).await;
    common::enable_fixed(&app, branch.service_ids[0], 800.0).await;

    let body = json!({ "scope": "category", "id": branch.category_id });
    let (status, response) = common::post_json(
        &app,
        "/api/provider-services/bulk-enable",
        &body,
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response["total_in_branch"], 3);
    assert_eq!(response["already_enabled"], 1);
    assert_eq!(response["enabled"], 2);

    let (_, mine) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 3);
    let fixed = mine
        .iter()
        .find(|r| r["service_id"] == branch.service_ids[0].to_string())
        .unwrap();
    assert_eq!(fixed["pricing_type"], "fixed", "Existing pricing must be kept");
    assert_eq!(
        mine.iter().filter(|r| r["pricing_type"] == "quote").count(),
        2
    );

    // A second run is a no-op.
    let (_, again) = common::post_json(
        &app,
        "/api/provider-services/bulk-enable",
        &body,
        As::Provider(partner()),
    )
    .await;
    assert_eq!(again["enabled"], 0);
    assert_eq!(again["already_enabled"], 3);
}

#[tokio::test]
async fn bulk_enable_resets_a_disabled_row_to_plain_quote() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Labour", 1).await;
    let uri = format!("/api/provider-services/{}", branch.service());
    let body = json!({
        "pricing_type": "range",
        "min_price": 300.0,
        "max_price": 900.0,
        "estimated_duration": "2 weeks"
    });
    let (status, _) = common::put_json(&app, &uri, &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::delete(&app, &uri, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);

    let bulk = json!({ "scope": "category", "id": branch.category_id });
    let (_, response) = common::post_json(
        &app,
        "/api/provider-services/bulk-enable",
        &bulk,
        As::Provider(partner()),
    )
    .await;
    assert_eq!(response["enabled"], 1);

    let (_, mine) = common::get(&app, "/api/provider-services", As::Provider(partner())).await;
    let row = &mine[0];
    assert_eq!(row["is_active"], true);
    assert_eq!(row["pricing_type"], "quote");
    assert!(row["min_price"].is_null());
    assert!(row["estimated_duration"].is_null(), "{row}");
}

#[tokio::test]
async fn bulk_enable_empty_branch() {
    let (app, _pool, _guard) = common::test_app().await;
    let body = json!({ "scope": "path", "id": uuid::Uuid::new_v4() });
    let (status, response) = common::post_json(
        &app,
        "/api/provider-services/bulk-enable",
        &body,
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["total_in_branch"], 0);
    assert_eq!(response["enabled"], 0);
}

#[tokio::test]
async fn copy_price_then_read_clipboard() {
    let (app, _pool, _guard) = common::test_app().await;

    let (status, _) =
        common::get(&app, "/api/provider-services/clipboard", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({ "pricing_type": "range", "min_price": 100.0, "max_price": 200.0 });
    let (status, copied) = common::put_json(
        &app,
        "/api/provider-services/clipboard",
        &body,
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{copied}");

    let (status, clip) =
        common::get(&app, "/api/provider-services/clipboard", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clip, copied);

    let (status, _) =
        common::get(&app, "/api/provider-services/clipboard", As::Provider(other_partner())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn commission_preview() {
    let (app, _pool, _guard) = common::test_app().await;

    let (status, preview) = common::get(
        &app,
        "/api/provider-services/commission-preview?price=1000",
        As::Provider(legal_arm()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["rate"], 50);
    assert_eq!(preview["commission"], 500.0);
    assert_eq!(preview["provider_share"], 500.0);

    let (status, _) = common::get(
        &app,
        "/api/provider-services/commission-preview?price=0",
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
