use axum::http::StatusCode;
use serde_json::json;

use crate::common::{self, partner, As};

#[tokio::test]
async fn report_summary_and_exports() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 1000.0).await;
    let done = common::create_completed_request(&app, branch.service()).await;
    common::create_test_request(&app, branch.service(), "Open work").await;

    let body = json!({ "request_id": done["id"], "minutes": 90, "description": "Research" });
    common::post_json(&app, "/api/time-logs", &body, As::Provider(partner())).await;

    let (status, summary) =
        common::get(&app, "/api/reports/summary", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_requests"], 2);
    assert_eq!(summary["by_status"]["completed"], 1);
    assert_eq!(summary["by_status"]["pending"], 1);
    assert_eq!(summary["completed_revenue"], 1000.0);
    assert_eq!(summary["commission"], 700.0);
    assert_eq!(summary["provider_share"], 300.0);
    assert_eq!(summary["total_minutes"], 90);

    let (status, headers, bytes) =
        common::get_raw(&app, "/api/reports/requests.csv", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/csv"));
    let csv = String::from_utf8(bytes).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,title,status,priority,quoted_price,sla_deadline,created_at"
    );
    assert_eq!(lines.count(), 2);

    let (status, headers, bytes) =
        common::get_raw(&app, "/api/reports/requests.html", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/html"));
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("Open work"));
}

#[tokio::test]
async fn report_window_must_be_ordered() {
    let (app, _pool, _guard) = common::test_app().await;
    let (status, _) = common::get(
        &app,
        "/api/reports/summary?from=2026-02-01T00:00:00Z&to=2026-01-01T00:00:00Z",
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, summary) = common::get(
        &app,
        "/api/reports/summary?from=2020-01-01T00:00:00Z&to=2020-02-01T00:00:00Z",
        As::Provider(partner()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_requests"], 0);
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_actions_are_logged() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;

    let admin = common::admin_token();
    let (status, page) = common::get(
        &app,
        "/api/admin/activity?entity_type=legal_service",
        As::Token(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{page}");
    let entries = page["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "provider_service.enable");
    assert_eq!(entries[0]["entity_id"], branch.service().to_string());

    let token = common::subscriber_token();
    let (status, _) = common::get(&app, "/api/admin/activity", As::Token(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn my_activity_lists_own_actions() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Family", 1).await;
    common::enable_fixed(&app, branch.service(), 100.0).await;
    let request = common::create_test_request(&app, branch.service(), "Audit me").await;

    let token = common::subscriber_token();
    let (status, page) = common::get(&app, "/api/activity", As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 1);
    assert_eq!(page["data"][0]["action"], "request.create");
    assert_eq!(page["data"][0]["entity_id"], request["id"]);

    let other = common::other_subscriber_token();
    let (_, page) = common::get(&app, "/api/activity", As::Token(&other)).await;
    assert!(page["data"].as_array().unwrap().is_empty());
}
