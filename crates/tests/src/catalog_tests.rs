use axum::http::StatusCode;
use serde_json::json;

use crate::common::{self, admin_token, partner, subscriber_token, As};

#[tokio::test]
async fn admin_builds_catalog_branch() {
    let (app, _pool, _guard) = common::test_app().await;
    let token = admin_token();

    let (status, category) = common::post_json(
        &app,
        "/api/catalog/categories",
        &json!({ "name": "Family Law", "name_ar": "الأحوال الشخصية" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{category}");

    let (status, sub) = common::post_json(
        &app,
        "/api/catalog/subcategories",
        &json!({ "category_id": category["id"], "name": "Divorce" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{sub}");

    let (status, path) = common::post_json(
        &app,
        "/api/catalog/paths",
        &json!({ "subcategory_id": sub["id"], "name": "Consultation" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{path}");

    let (status, service) = common::post_json(
        &app,
        "/api/catalog/services",
        &json!({ "path_id": path["id"], "name": "Divorce consultation" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{service}");
    assert_eq!(service["category_id"], category["id"]);
    assert_eq!(service["subcategory_id"], sub["id"]);

    let (status, tree) = common::get(&app, "/api/catalog/tree", As::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
    let tree = tree.as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["name"], "Family Law");
    let services = &tree[0]["subcategories"][0]["paths"][0]["services"];
    assert_eq!(services[0]["name"], "Divorce consultation");
}

#[tokio::test]
async fn catalog_writes_require_admin() {
    let (app, _pool, _guard) = common::test_app().await;
    let body = json!({ "name": "Labour" });

    let (status, _) = common::post_json(&app, "/api/catalog/categories", &body, As::Anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = subscriber_token();
    let (status, response) =
        common::post_json(&app, "/api/catalog/categories", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["kind"], "Forbidden");
}

#[tokio::test]
async fn services_filter_by_branch_and_search() {
    let (app, pool, _guard) = common::test_app().await;
    let family = common::create_catalog_branch(&pool, "Family", 2).await;
    let labour = common::create_catalog_branch(&pool, "Labour", 1).await;

    let uri = format!("/api/catalog/services?category_id={}", family.category_id);
    let (status, list) = common::get(&app, &uri, As::Anonymous).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let uri = format!("/api/catalog/services?path_id={}", labour.path_id);
    let (_, list) = common::get(&app, &uri, As::Anonymous).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, list) = common::get(&app, "/api/catalog/services?search=LABOUR", As::Anonymous).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Labour service 0"]);
}

#[tokio::test]
async fn inactive_services_are_hidden() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Commercial", 2).await;
    sqlx::query("UPDATE legal_services SET is_active = FALSE WHERE id = $1")
        .bind(branch.service_ids[1])
        .execute(&pool)
        .await
        .unwrap();

    let (_, list) = common::get(&app, "/api/catalog/services", As::Anonymous).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], branch.service_ids[0].to_string());
}

#[tokio::test]
async fn mine_only_needs_provider_scope() {
    let (app, pool, _guard) = common::test_app().await;
    let branch = common::create_catalog_branch(&pool, "Real Estate", 3).await;

    let (status, _) =
        common::get(&app, "/api/catalog/services?mine_only=true", As::Anonymous).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::enable_fixed(&app, branch.service_ids[2], 500.0).await;

    let (status, list) =
        common::get(&app, "/api/catalog/services?mine_only=true", As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], branch.service_ids[2].to_string());
}
